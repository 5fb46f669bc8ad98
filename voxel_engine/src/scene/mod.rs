//! Scene module
//!
//! Game objects with transforms, the meshes they reference, and the scene
//! that owns both.

mod game_object;
mod mesh;
mod mesh_arena;
mod scene;
mod transform;

pub use game_object::{GameObject, GameObjectId, PointLightComponent};
pub use mesh::{Mesh, Vertex};
pub use mesh_arena::{MeshArena, MeshHandle};
pub use scene::Scene;
pub use transform::Transform;
