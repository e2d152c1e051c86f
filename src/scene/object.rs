use crate::asset::{Handle, Mesh};
use crate::renderer::Material;
use crate::scene::Transform;

/// Something the batch renderer can draw: one mesh, one material, one transform.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawableObject {
    pub name: String,
    pub mesh: Handle<Mesh>,
    pub material: Handle<Material>,
    pub transform: Transform,
}

impl DrawableObject {
    pub fn new(name: impl Into<String>, mesh: Handle<Mesh>, material: Handle<Material>) -> Self {
        Self {
            name: name.into(),
            mesh,
            material,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Generational slot index of a registered object. A removed object's id
/// stops resolving even if its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ObjectId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}
