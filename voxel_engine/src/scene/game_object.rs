/// GameObject - a drawable or light in the scene

use glam::Vec3;

use crate::utils::IdAllocator;
use super::mesh_arena::MeshHandle;
use super::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameObjectId(pub u32);

/// Marks a game object as a point light
///
/// The light radius is the object's uniform scale and its color the object color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightComponent {
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    id: GameObjectId,
    pub mesh: Option<MeshHandle>,
    pub color: Vec3,
    pub transform: Transform,
    pub point_light: Option<PointLightComponent>,
}

impl GameObject {
    /// Empty object with the next id from `ids`
    pub fn new(ids: &mut IdAllocator) -> Self {
        Self {
            id: GameObjectId(ids.alloc()),
            mesh: None,
            color: Vec3::ZERO,
            transform: Transform::default(),
            point_light: None,
        }
    }

    pub fn make_point_light(ids: &mut IdAllocator, radius: f32, color: Vec3, intensity: f32) -> Self {
        let mut object = Self::new(ids);
        object.color = color;
        object.transform.scale = radius;
        object.point_light = Some(PointLightComponent { intensity });
        object
    }

    pub fn with_mesh(mut self, mesh: MeshHandle) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn id(&self) -> GameObjectId {
        self.id
    }

    pub fn is_point_light(&self) -> bool {
        self.point_light.is_some()
    }
}
