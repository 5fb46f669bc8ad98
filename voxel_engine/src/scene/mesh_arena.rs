/// MeshArena - owns meshes and hands out stable `MeshHandle` keys
///
/// Several game objects may share one handle. Removing a mesh invalidates
/// its handle; stale handles resolve to `None` instead of aliasing a newer mesh.

use slotmap::{new_key_type, SlotMap};

use crate::graphics_device::GraphicsDevice;
use super::mesh::Mesh;

new_key_type! {
    /// Stable key of a mesh in a `MeshArena`
    pub struct MeshHandle;
}

pub struct MeshArena<'d, D: GraphicsDevice> {
    meshes: SlotMap<MeshHandle, Mesh<'d, D>>,
}

impl<D: GraphicsDevice> Default for MeshArena<'_, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d, D: GraphicsDevice> MeshArena<'d, D> {
    pub fn new() -> Self {
        Self { meshes: SlotMap::with_key() }
    }

    pub fn insert(&mut self, mesh: Mesh<'d, D>) -> MeshHandle {
        self.meshes.insert(mesh)
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Mesh<'d, D>> {
        self.meshes.get(handle)
    }

    /// Remove and return the mesh; its GPU buffers are freed when the value drops
    pub fn remove(&mut self, handle: MeshHandle) -> Option<Mesh<'d, D>> {
        self.meshes.remove(handle)
    }

    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.meshes.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
