/// Scene - game objects plus the meshes they draw
///
/// The scene owns the `IdAllocator` its objects are created with, so ids are
/// unique within one scene and never reused after removal.

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::graphics_device::GraphicsDevice;
use crate::utils::IdAllocator;
use super::game_object::{GameObject, GameObjectId};
use super::mesh::Mesh;
use super::mesh_arena::{MeshArena, MeshHandle};

pub struct Scene<'d, D: GraphicsDevice> {
    ids: IdAllocator,
    objects: FxHashMap<GameObjectId, GameObject>,
    meshes: MeshArena<'d, D>,
}

impl<D: GraphicsDevice> Default for Scene<'_, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d, D: GraphicsDevice> Scene<'d, D> {
    pub fn new() -> Self {
        Self::with_id_allocator(IdAllocator::new())
    }

    pub fn with_id_allocator(ids: IdAllocator) -> Self {
        Self {
            ids,
            objects: FxHashMap::default(),
            meshes: MeshArena::new(),
        }
    }

    // ===== MESHES =====

    pub fn add_mesh(&mut self, mesh: Mesh<'d, D>) -> MeshHandle {
        self.meshes.insert(mesh)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh<'d, D>> {
        self.meshes.get(handle)
    }

    pub fn meshes(&self) -> &MeshArena<'d, D> {
        &self.meshes
    }

    /// Remove a mesh that no object references any more
    ///
    /// Returns `None` when the handle is unknown or still in use.
    pub fn remove_mesh(&mut self, handle: MeshHandle) -> Option<Mesh<'d, D>> {
        if self.objects.values().any(|o| o.mesh == Some(handle)) {
            return None;
        }
        self.meshes.remove(handle)
    }

    // ===== OBJECTS =====

    /// Create an empty object and return it for configuration
    pub fn spawn(&mut self) -> &mut GameObject {
        let object = GameObject::new(&mut self.ids);
        self.objects.entry(object.id()).or_insert(object)
    }

    /// Create an object drawing `mesh`
    pub fn spawn_mesh(&mut self, mesh: MeshHandle) -> &mut GameObject {
        debug_assert!(self.meshes.contains(mesh), "Spawning an object with an unknown mesh");
        let object = self.spawn();
        object.mesh = Some(mesh);
        object
    }

    pub fn spawn_point_light(&mut self, radius: f32, color: Vec3, intensity: f32) -> GameObjectId {
        let light = GameObject::make_point_light(&mut self.ids, radius, color, intensity);
        let id = light.id();
        self.objects.insert(id, light);
        id
    }

    pub fn object(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    pub fn remove(&mut self, id: GameObjectId) -> Option<GameObject> {
        self.objects.remove(&id)
    }

    /// All objects, in no particular order
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.values_mut()
    }

    pub fn point_lights(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values().filter(|o| o.is_point_light())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
