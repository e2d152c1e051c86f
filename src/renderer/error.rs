use crate::asset::{Handle, Mesh};
use crate::renderer::{Material, ShaderProgram};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The program does not expose a uniform the pass needs.
    MissingUniform {
        program: Handle<ShaderProgram>,
        name: &'static str,
    },
    UnknownMaterial(Handle<Material>),
    UnknownProgram(Handle<ShaderProgram>),
    UnknownMesh(Handle<Mesh>),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MissingUniform { program, name } => {
                write!(f, "Program {:?} has no uniform '{}'", program, name)
            }
            RenderError::UnknownMaterial(h) => write!(f, "Unknown material {:?}", h),
            RenderError::UnknownProgram(h) => write!(f, "Unknown shader program {:?}", h),
            RenderError::UnknownMesh(h) => write!(f, "Unknown mesh {:?}", h),
        }
    }
}

impl std::error::Error for RenderError {}
