// scene/render_key.rs
//
// Three-level grouping of registered objects by rendering cost: shading
// program first (most expensive to switch), then material, then mesh.
// Buckets never exist empty; removal prunes bottom-up.

use std::collections::BTreeMap;

use crate::asset::{Assets, Handle, Mesh};
use crate::renderer::{Material, ShaderProgram};
use crate::scene::{DrawableObject, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderKey {
    pub program: Handle<ShaderProgram>,
    pub material: Handle<Material>,
    pub mesh: Handle<Mesh>,
}

impl RenderKey {
    /// `None` when the object's material is not in `assets`.
    pub fn for_object(object: &DrawableObject, assets: &Assets) -> Option<Self> {
        let program = assets.program_of(object.material)?;
        Some(Self {
            program,
            material: object.material,
            mesh: object.mesh,
        })
    }
}

pub type MeshBuckets = BTreeMap<Handle<Mesh>, Vec<ObjectId>>;
pub type MaterialBuckets = BTreeMap<Handle<Material>, MeshBuckets>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderGroupIndex {
    groups: BTreeMap<Handle<ShaderProgram>, MaterialBuckets>,
}

impl RenderGroupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` to the bucket for `key`, creating missing levels.
    pub fn insert(&mut self, key: RenderKey, id: ObjectId) {
        self.groups
            .entry(key.program)
            .or_default()
            .entry(key.material)
            .or_default()
            .entry(key.mesh)
            .or_default()
            .push(id);
    }

    /// Removes `id` from the bucket for `key` and prunes every level left
    /// empty. Returns false, touching nothing, if the id is not there.
    pub fn remove(&mut self, key: RenderKey, id: ObjectId) -> bool {
        let Some(materials) = self.groups.get_mut(&key.program) else {
            return false;
        };
        let Some(meshes) = materials.get_mut(&key.material) else {
            return false;
        };
        let Some(objects) = meshes.get_mut(&key.mesh) else {
            return false;
        };
        let Some(pos) = objects.iter().position(|o| *o == id) else {
            return false;
        };

        objects.remove(pos);
        if objects.is_empty() {
            meshes.remove(&key.mesh);
            if meshes.is_empty() {
                materials.remove(&key.material);
                if materials.is_empty() {
                    self.groups.remove(&key.program);
                }
            }
        }
        true
    }

    pub fn programs(
        &self,
    ) -> impl Iterator<Item = (Handle<ShaderProgram>, &MaterialBuckets)> + '_ {
        self.groups.iter().map(|(h, m)| (*h, m))
    }

    pub fn bucket(&self, key: RenderKey) -> Option<&[ObjectId]> {
        self.groups
            .get(&key.program)?
            .get(&key.material)?
            .get(&key.mesh)
            .map(Vec::as_slice)
    }

    /// Every leaf bucket, program-major, material second, mesh minor.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (Handle<ShaderProgram>, Handle<Material>, Handle<Mesh>, &[ObjectId])> + '_
    {
        self.groups.iter().flat_map(|(program, materials)| {
            materials.iter().flat_map(move |(material, meshes)| {
                meshes
                    .iter()
                    .map(move |(mesh, ids)| (*program, *material, *mesh, ids.as_slice()))
            })
        })
    }

    /// Objects regrouped by mesh alone, in index order within each mesh.
    pub fn by_mesh(&self) -> MeshBuckets {
        let mut meshes = MeshBuckets::new();
        for (_, _, mesh, ids) in self.iter() {
            meshes.entry(mesh).or_default().extend_from_slice(ids);
        }
        meshes
    }

    pub fn program_count(&self) -> usize {
        self.groups.len()
    }

    pub fn material_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Number of (program, material, mesh) leaf buckets.
    pub fn mesh_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Number of object ids across all buckets.
    pub fn leaf_count(&self) -> usize {
        self.iter().map(|(_, _, _, ids)| ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}
