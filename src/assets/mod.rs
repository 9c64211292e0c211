//! Walk-mesh bundles on disk and the built-in level used when none is given.

mod bundle;
mod chunks;
mod plane;

pub use bundle::{BundleError, WalkMeshes};
pub use plane::{BOARD_HALF_EXTENT, LEVEL_MESH_NAME, level_plane, level_scene, quad_plane};
