//! Procedural level: one flat square walk mesh under the 4×4 board, plus
//! the scene nodes the play mode expects to find.

use glam::{UVec3, Vec3};

use crate::world::{Scene, Transform, WalkMesh, WalkMeshError};

/// Name the play mode looks the walk mesh up by.
pub const LEVEL_MESH_NAME: &str = "WalkMesh";

/// Half the side of the walkable square; the board spans `[-10, 10]²`.
pub const BOARD_HALF_EXTENT: f32 = 15.0;

/// Square `[-half, half]²` on z = 0, split along the anti-diagonal
/// `x + y = 0`.
pub fn quad_plane(half: f32) -> Result<WalkMesh, WalkMeshError> {
    WalkMesh::with_smooth_normals(
        vec![
            Vec3::new(-half, -half, 0.0),
            Vec3::new(half, -half, 0.0),
            Vec3::new(half, half, 0.0),
            Vec3::new(-half, half, 0.0),
        ],
        vec![UVec3::new(0, 1, 3), UVec3::new(1, 2, 3)],
    )
}

pub fn level_plane() -> Result<WalkMesh, WalkMeshError> {
    quad_plane(BOARD_HALF_EXTENT)
}

/// Ground and destination marker.  `marker_at` is usually the centre of the
/// destination cell.
pub fn level_scene(marker_name: &str, marker_at: Vec3) -> Scene {
    let mut scene = Scene::new();
    scene.spawn(Transform::named("Plane"));
    scene.spawn(Transform::at(marker_name, marker_at));
    scene
}
