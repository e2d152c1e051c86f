// scene/registry.rs
//
// Name-unique ownership of drawable objects. Every mutation keeps the
// render-group index in step: an object is in exactly one bucket while it
// is registered and in none afterwards.

use std::collections::HashMap;

use crate::asset::Assets;
use crate::scene::render_key::{RenderGroupIndex, RenderKey};
use crate::scene::{AddError, DrawableObject, ObjectId, SceneError, Transform};

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<(DrawableObject, RenderKey)>,
}

#[derive(Debug, Default)]
pub struct ObjectRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<String, ObjectId>,
    index: RenderGroupIndex,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: DrawableObject, assets: &Assets) -> Result<ObjectId, AddError> {
        if self.names.contains_key(&object.name) {
            return Err(AddError::DuplicateName { object });
        }
        if !assets.meshes.contains(object.mesh) {
            return Err(AddError::UnknownMesh { object });
        }
        let Some(key) = RenderKey::for_object(&object, assets) else {
            return Err(AddError::UnknownMaterial { object });
        };

        let id = match self.free.pop() {
            Some(index) => {
                ObjectId {
                    index,
                    generation: self.slots[index as usize].generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                ObjectId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };

        log::debug!("Registered '{}' as {:?} under {:?}", object.name, id, key);
        self.index.insert(key, id);
        self.names.insert(object.name.clone(), id);
        self.slots[id.index as usize].entry = Some((object, key));
        Ok(id)
    }

    /// Unregisters `name`, pruning its buckets, and hands the object back.
    pub fn remove(&mut self, name: &str) -> Result<DrawableObject, SceneError> {
        let id = *self
            .names
            .get(name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
        let slot = &mut self.slots[id.index as usize];
        let Some((object, key)) = slot.entry.take() else {
            return Err(SceneError::ObjectNotFound(name.to_string()));
        };

        let removed = self.index.remove(key, id);
        debug_assert!(removed, "'{}' was registered but not indexed", name);

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.names.remove(name);
        log::debug!("Removed '{}' ({:?})", name, id);
        Ok(object)
    }

    pub fn get(&self, name: &str) -> Option<&DrawableObject> {
        self.id_of(name).and_then(|id| self.get_by_id(id))
    }

    /// Mutable access to an object's transform. Mesh and material are fixed
    /// while registered; remove and re-add to change them.
    pub fn transform_mut(&mut self, name: &str) -> Option<&mut Transform> {
        let id = self.id_of(name)?;
        self.slot_entry_mut(id).map(|(object, _)| &mut object.transform)
    }

    pub fn set_transform(&mut self, name: &str, transform: Transform) -> Result<(), SceneError> {
        let slot = self
            .transform_mut(name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
        *slot = transform;
        Ok(())
    }

    pub fn id_of(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    /// `None` for ids whose object has since been removed.
    pub fn get_by_id(&self, id: ObjectId) -> Option<&DrawableObject> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref().map(|(object, _)| object)
    }

    fn slot_entry_mut(&mut self, id: ObjectId) -> Option<&mut (DrawableObject, RenderKey)> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn key_of(&self, name: &str) -> Option<RenderKey> {
        let id = self.id_of(name)?;
        let slot = self.slots.get(id.index as usize)?;
        slot.entry.as_ref().map(|(_, key)| *key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &DrawableObject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|(object, _)| {
                (
                    ObjectId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    object,
                )
            })
        })
    }

    pub fn index(&self) -> &RenderGroupIndex {
        &self.index
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.names.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Handle;
    use crate::renderer::{cube, quad, Material, ShaderProgram};
    use glam::Vec3;

    fn assets() -> Assets {
        let mut assets = Assets::new();
        let lit = assets.add_program(ShaderProgram::lit());
        assets.add_material(Material::rgb("red", lit, 255, 0, 0));
        assets.add_mesh(cube());
        assets.add_mesh(quad());
        assets
    }

    fn object(name: &str) -> DrawableObject {
        DrawableObject::new(name, Handle::new(0), Handle::new(0))
    }

    #[test]
    fn duplicate_name_hands_object_back() {
        let assets = assets();
        let mut registry = ObjectRegistry::new();
        registry.add(object("a"), &assets).unwrap();

        let dup = object("a").with_transform(Transform::from_translation(Vec3::X));
        let err = registry.add(dup.clone(), &assets).unwrap_err();
        assert!(matches!(err, AddError::DuplicateName { .. }));
        assert_eq!(err.into_object(), dup);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.index().leaf_count(), 1);
        assert_eq!(registry.get("a").unwrap().transform, Transform::default());
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let assets = assets();
        let mut registry = ObjectRegistry::new();

        let bad_material = DrawableObject::new("m", Handle::new(0), Handle::new(7));
        assert!(matches!(
            registry.add(bad_material, &assets),
            Err(AddError::UnknownMaterial { .. })
        ));
        let bad_mesh = DrawableObject::new("n", Handle::new(7), Handle::new(0));
        assert!(matches!(
            registry.add(bad_mesh, &assets),
            Err(AddError::UnknownMesh { .. })
        ));
        assert!(registry.is_empty());
        assert!(registry.index().is_empty());
    }

    #[test]
    fn remove_returns_object_and_prunes_index() {
        let assets = assets();
        let mut registry = ObjectRegistry::new();
        registry.add(object("a"), &assets).unwrap();

        let removed = registry.remove("a").unwrap();
        assert_eq!(removed.name, "a");
        assert!(registry.is_empty());
        assert!(registry.index().is_empty());
    }

    #[test]
    fn removing_unknown_name_is_an_error() {
        let assets = assets();
        let mut registry = ObjectRegistry::new();
        registry.add(object("a"), &assets).unwrap();

        assert_eq!(
            registry.remove("ghost"),
            Err(SceneError::ObjectNotFound("ghost".into()))
        );
        assert!(!registry.contains("ghost"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.index().leaf_count(), 1);
    }

    #[test]
    fn stale_ids_stop_resolving_after_slot_reuse() {
        let assets = assets();
        let mut registry = ObjectRegistry::new();
        let old = registry.add(object("a"), &assets).unwrap();
        registry.remove("a").unwrap();

        let new = registry.add(object("b"), &assets).unwrap();
        assert_eq!(old.index(), new.index());
        assert!(registry.get_by_id(old).is_none());
        assert_eq!(registry.get_by_id(new).unwrap().name, "b");
    }

    #[test]
    fn set_transform_updates_in_place() {
        let assets = assets();
        let mut registry = ObjectRegistry::new();
        registry.add(object("a"), &assets).unwrap();

        let moved = Transform::from_translation(Vec3::new(0.0, 2.0, 0.0));
        registry.set_transform("a", moved).unwrap();
        assert_eq!(registry.get("a").unwrap().transform, moved);
        assert!(registry.set_transform("b", moved).is_err());
    }

    #[test]
    fn clear_empties_everything() {
        let assets = assets();
        let mut registry = ObjectRegistry::new();
        let id = registry.add(object("a"), &assets).unwrap();
        registry.add(object("b"), &assets).unwrap();

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.index().is_empty());
        assert!(registry.get_by_id(id).is_none());
        assert_eq!(registry.iter().count(), 0);
    }
}
