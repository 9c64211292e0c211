//! Tuning values for the level.  Everything the play mode treats as a
//! constant lives here so the binary can override it from the CLI.

use std::f32::consts::PI;

use glam::Vec3;

use crate::assets::LEVEL_MESH_NAME;

#[derive(Clone, Debug, PartialEq)]
pub struct PlayConfig {
    /// walking speed, world units per second
    pub player_speed: f32,
    /// spawn / reset position; also the origin of the layout grid
    pub start: Vec3,
    /// camera height above the player's feet
    pub eye_height: f32,
    /// vertical field of view, radians
    pub fovy: f32,
    pub near: f32,
    /// camera pitch after spawn/reset (π/2 = looking along player +Y)
    pub default_pitch: f32,
    /// pitch is clamped to `[min, max]`, strictly inside `[0, π]`
    pub pitch_limits: (f32, f32),
    /// side of one layout cell, world units
    pub cell_size: f32,
    /// pause between a game-over/destination and the reset, seconds
    pub reset_delay: f32,
    /// name of the destination marker transform
    pub marker_name: String,
    /// applied to the marker once the destination is reached
    pub marker_drop: Vec3,
    /// a marker whose z is at or below this is considered dropped
    pub marker_restore_below: f32,
    /// walk mesh to look up in a bundle
    pub walkmesh: String,
    /// emit walk-mesh wireframe lines in every frame
    pub show_walkmesh: bool,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            player_speed: 3.0,
            start: Vec3::new(-10.0, -10.0, 0.0),
            eye_height: 1.8,
            fovy: 60.0_f32.to_radians(),
            near: 0.01,
            default_pitch: 90.0_f32.to_radians(),
            pitch_limits: (0.05 * PI, 0.95 * PI),
            cell_size: 5.0,
            reset_delay: 2.0,
            marker_name: "Cone".to_string(),
            marker_drop: Vec3::new(0.0, 0.0, -100.0),
            marker_restore_below: -50.0,
            walkmesh: LEVEL_MESH_NAME.to_string(),
            show_walkmesh: true,
        }
    }
}
