pub mod cache;
pub mod handle;
pub mod mesh;

pub use cache::AssetCache;
pub use handle::Handle;
pub use mesh::{v, Mesh, Vertex};

use crate::renderer::{Material, ShaderProgram};

/// Everything the renderer references but does not own per object.
pub struct Assets {
    pub programs: AssetCache<ShaderProgram>,
    pub materials: AssetCache<Material>,
    pub meshes: AssetCache<Mesh>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            programs: AssetCache::new(),
            materials: AssetCache::new(),
            meshes: AssetCache::new(),
        }
    }

    pub fn add_program(&mut self, program: ShaderProgram) -> Handle<ShaderProgram> {
        self.programs.insert(program)
    }

    pub fn add_material(&mut self, material: Material) -> Handle<Material> {
        self.materials.insert(material)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> Handle<Mesh> {
        self.meshes.insert(mesh)
    }

    /// Shading program a material renders with, if the material exists.
    pub fn program_of(&self, material: Handle<Material>) -> Option<Handle<ShaderProgram>> {
        self.materials.get(material).map(|m| m.program)
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}
