use crate::scene::DrawableObject;

/// A rejected registration. The object is handed back untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum AddError {
    DuplicateName { object: DrawableObject },
    UnknownMaterial { object: DrawableObject },
    UnknownMesh { object: DrawableObject },
}

impl AddError {
    pub fn object(&self) -> &DrawableObject {
        match self {
            AddError::DuplicateName { object }
            | AddError::UnknownMaterial { object }
            | AddError::UnknownMesh { object } => object,
        }
    }

    pub fn into_object(self) -> DrawableObject {
        match self {
            AddError::DuplicateName { object }
            | AddError::UnknownMaterial { object }
            | AddError::UnknownMesh { object } => object,
        }
    }
}

impl std::fmt::Display for AddError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddError::DuplicateName { object } => {
                write!(f, "An object named '{}' already exists", object.name)
            }
            AddError::UnknownMaterial { object } => write!(
                f,
                "Object '{}' uses unknown material {:?}",
                object.name, object.material
            ),
            AddError::UnknownMesh { object } => write!(
                f,
                "Object '{}' uses unknown mesh {:?}",
                object.name, object.mesh
            ),
        }
    }
}

impl std::error::Error for AddError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    ObjectNotFound(String),
    PortalNotFound(String),
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::ObjectNotFound(name) => write!(f, "No object named '{}'", name),
            SceneError::PortalNotFound(label) => write!(f, "No portal labelled '{}'", label),
        }
    }
}

impl std::error::Error for SceneError {}
