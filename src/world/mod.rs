mod scene;
mod walkmesh;

pub use scene::{Camera, Parent, Scene, SceneError, Transform};
pub use walkmesh::{VertexId, WalkMesh, WalkMeshError, WalkPoint};
