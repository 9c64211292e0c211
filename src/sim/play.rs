//! The playable level: first-person walking on the walk mesh, the
//! checkerboard state and the pause-then-reset loop.

use std::path::Path;

use glam::{Quat, UVec2, Vec2, Vec3};
use hecs::Entity;
use smallvec::smallvec;
use thiserror::Error;

use super::input::{Buttons, Controls, InputEvent, Key};
use super::layout::{LevelState, ResetTimer, destination_cell, pos_to_layout};
use super::walker::{align_to_normal, walk, yaw_about};
use crate::assets::{BundleError, WalkMeshes, level_plane, level_scene};
use crate::config::PlayConfig;
use crate::mode::Mode;
use crate::renderer::{CameraView, Frame, HudLines, HudText, Light, Rgba, WorldLine};
use crate::world::{Camera, Scene, SceneError, Transform, WalkMesh, WalkMeshError, WalkPoint};

/// Clear colours: cream, yellow, orange, red, dark blue.
pub const PALETTE: [Vec3; 5] = [
    Vec3::new(0.9176, 0.8828, 0.7176),
    Vec3::new(0.9882, 0.7490, 0.2863),
    Vec3::new(0.9686, 0.4980, 0.0000),
    Vec3::new(0.8392, 0.1569, 0.1569),
    Vec3::new(0.0000, 0.1882, 0.2863),
];

/// HUD glyph height in screen units.
const HUD_HEIGHT: f32 = 0.3;
const BLACK: Rgba = 0x0000_0000;
const WHITE: Rgba = 0x00FF_FFFF;
const WIREFRAME: Rgba = 0x0088_00FF;
const MARKER: Rgba = 0x0000_0000;

const LIGHT: Light = Light {
    direction: Vec3::NEG_Z,
    energy: Vec3::new(1.0, 1.0, 0.95),
};

#[derive(Error, Debug)]
pub enum PlayError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Mesh(#[from] WalkMeshError),

    #[error("scene has no transform named '{0}'")]
    MissingTarget(String),
}

/// Player rig: a body that walks and a camera child that pitches.
#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub transform: Entity,
    pub camera: Entity,
    pub at: WalkPoint,
    /// camera rotation about its local X; π/2 looks along body +Y
    pub pitch: f32,
}

pub struct PlayMode {
    config: PlayConfig,
    mesh: WalkMesh,
    scene: Scene,
    player: Player,
    target: Entity,
    state: LevelState,
    reset: ResetTimer,
    controls: Controls,
    mouse_captured: bool,
}

/*──────────────────────────── construction ───────────────────────────*/

impl PlayMode {
    /// Takes ownership of the level scene and adds the player rig to it.
    pub fn new(config: PlayConfig, mesh: WalkMesh, mut scene: Scene) -> Result<Self, PlayError> {
        let target = scene
            .find(&config.marker_name)
            .ok_or_else(|| PlayError::MissingTarget(config.marker_name.clone()))?;

        let body = scene.spawn(Transform::at("Player", config.start));
        let mut eye = Transform::at("PlayerEye", Vec3::new(0.0, 0.0, config.eye_height));
        eye.rotation = Quat::from_rotation_x(config.default_pitch);
        let camera = scene.spawn_child(eye, body);
        scene.attach_camera(
            camera,
            Camera {
                fovy: config.fovy,
                near: config.near,
            },
        )?;

        let at = mesh.nearest_walk_point(config.start);
        let state = pos_to_layout(config.start, config.start, config.cell_size);

        Ok(Self {
            player: Player {
                transform: body,
                camera,
                at,
                pitch: config.default_pitch,
            },
            config,
            mesh,
            scene,
            target,
            state,
            reset: ResetTimer::default(),
            controls: Controls::default(),
            mouse_captured: false,
        })
    }

    /// Walk mesh `config.walkmesh` from the bundle at `walkmeshes`, or the
    /// built-in plane when no bundle is given.  The scene is the built-in one
    /// with the marker centred on the destination cell.
    pub fn load(config: PlayConfig, walkmeshes: Option<&Path>) -> Result<Self, PlayError> {
        let mesh = match walkmeshes {
            Some(path) => WalkMeshes::from_file(path)?.lookup(&config.walkmesh)?.clone(),
            None => level_plane()?,
        };
        let marker_at = match destination_cell() {
            Some((col, row)) => {
                let centre = (Vec2::new(col as f32, row as f32) + 0.5) * config.cell_size;
                config.start + centre.extend(0.0)
            }
            None => config.start,
        };
        let scene = level_scene(&config.marker_name, marker_at);
        Self::new(config, mesh, scene)
    }
}

/*──────────────────────────── accessors ──────────────────────────────*/

impl PlayMode {
    #[inline]
    pub fn state(&self) -> LevelState {
        self.state
    }

    #[inline]
    pub fn player(&self) -> &Player {
        &self.player
    }

    #[inline]
    pub fn mesh(&self) -> &WalkMesh {
        &self.mesh
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn reset_timer(&self) -> ResetTimer {
        self.reset
    }

    /// Host should hide the cursor and report relative motion while `true`.
    #[inline]
    pub fn mouse_captured(&self) -> bool {
        self.mouse_captured
    }

    pub fn target_position(&self) -> Result<Vec3, PlayError> {
        Ok(self.scene.transform(self.target)?.position)
    }
}

/*──────────────────────────── simulation ─────────────────────────────*/

impl PlayMode {
    /// Mouse-look by a window-height normalised motion.
    fn look(&mut self, motion: Vec2) -> Result<(), PlayError> {
        let fovy = self.scene.camera(self.player.camera)?.fovy;
        let up = self.mesh.to_world_smooth_normal(&self.player.at);
        {
            let mut body = self.scene.transform_mut(self.player.transform)?;
            body.rotation = yaw_about(body.rotation, up, -motion.x * fovy);
        }

        let (lo, hi) = self.config.pitch_limits;
        self.player.pitch = (self.player.pitch + motion.y * fovy).clamp(lo, hi);
        self.scene.transform_mut(self.player.camera)?.rotation =
            Quat::from_rotation_x(self.player.pitch);
        Ok(())
    }

    fn walk_player(&mut self, elapsed: f32) -> Result<(), PlayError> {
        let axis = self.controls.move_axis() * self.config.player_speed * elapsed;
        let step = self
            .scene
            .local_to_world(self.player.transform)?
            .transform_vector3(axis.extend(0.0));

        let walked = walk(&self.mesh, self.player.at, step);
        if walked.hit_wall {
            log::trace!("slid along a wall ({} walk steps)", walked.steps);
        }
        self.player.at = walked.at;

        let position = self.mesh.to_world_point(&walked.at);
        let up = self.mesh.to_world_smooth_normal(&walked.at);
        {
            let mut body = self.scene.transform_mut(self.player.transform)?;
            body.position = position;
            body.rotation = align_to_normal(body.rotation, up);
        }

        self.set_state(pos_to_layout(position, self.config.start, self.config.cell_size));
        Ok(())
    }

    fn set_state(&mut self, state: LevelState) {
        if state != self.state {
            log::debug!("level state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    /// Start the countdown on the first terminal tick of an episode.
    fn arm_reset(&mut self) -> Result<(), PlayError> {
        if !self.state.is_terminal() || !self.reset.arm(self.config.reset_delay) {
            return Ok(());
        }
        log::debug!("{:?}: resetting in {}s", self.state, self.config.reset_delay);
        if self.state == LevelState::Destination {
            self.scene.transform_mut(self.target)?.position += self.config.marker_drop;
        }
        Ok(())
    }

    /// Put the marker back and the player on the spawn pose.
    pub fn reset_game(&mut self) -> Result<(), PlayError> {
        {
            let mut target = self.scene.transform_mut(self.target)?;
            if target.position.z <= self.config.marker_restore_below {
                target.position -= self.config.marker_drop;
            }
        }
        {
            let mut body = self.scene.transform_mut(self.player.transform)?;
            body.position = self.config.start;
            body.rotation = Quat::IDENTITY;
        }
        self.player.pitch = self.config.default_pitch;
        self.scene.transform_mut(self.player.camera)?.rotation =
            Quat::from_rotation_x(self.player.pitch);

        self.player.at = self.mesh.nearest_walk_point(self.config.start);
        self.set_state(pos_to_layout(
            self.config.start,
            self.config.start,
            self.config.cell_size,
        ));
        log::debug!("level reset");
        Ok(())
    }
}

/*──────────────────────────── presentation ───────────────────────────*/

pub fn clear_color(state: LevelState) -> Vec3 {
    match state {
        LevelState::GameOver => PALETTE[PALETTE.len() - 1],
        LevelState::Destination => PALETTE[1],
        LevelState::Floor(n) => {
            assert!((n as usize) < PALETTE.len(), "no colour for floor {n}");
            PALETTE[n as usize]
        }
    }
}

pub fn hud_lines(state: LevelState, aspect: f32) -> HudLines {
    const H: f32 = HUD_HEIGHT;
    let text = |text: &str, x: f32, y: f32, color| HudText {
        text: text.to_owned(),
        anchor: Vec2::new(-aspect + x * H, -1.0 + y * H),
        height: H,
        color,
    };
    match state {
        LevelState::GameOver => smallvec![text("Game Over", 4.0, 5.0, WHITE)],
        LevelState::Destination => smallvec![
            text("You've reached the", 2.5, 5.0, BLACK),
            text("Destination", 4.0, 3.5, BLACK),
        ],
        LevelState::Floor(n) => {
            let color = if n < 2 { BLACK } else { WHITE };
            smallvec![text(&n.to_string(), 5.5, 5.0, color)]
        }
    }
}

impl PlayMode {
    /// Square-based pyramid standing on the marker origin.
    fn marker_lines(&self, out: &mut Vec<WorldLine>) -> Result<(), PlayError> {
        let to_world = self.scene.local_to_world(self.target)?;
        let apex = to_world.transform_point3(Vec3::new(0.0, 0.0, 1.5));
        let base = [
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ]
        .map(|p| to_world.transform_point3(p));
        for (i, &corner) in base.iter().enumerate() {
            let next = base[(i + 1) % base.len()];
            out.push(WorldLine { a: corner, b: next, color: MARKER });
            out.push(WorldLine { a: corner, b: apex, color: MARKER });
        }
        Ok(())
    }
}

/*──────────────────────────── Mode impl ──────────────────────────────*/

impl Mode for PlayMode {
    type Error = PlayError;

    fn handle_event(&mut self, event: &InputEvent, window_size: UVec2) -> Result<bool, PlayError> {
        match *event {
            InputEvent::KeyDown(Key::Escape) => {
                self.mouse_captured = false;
                Ok(true)
            }
            InputEvent::KeyDown(key) => match Buttons::from_key(key) {
                Some(button) => {
                    self.controls.press(button);
                    Ok(true)
                }
                None => Ok(false),
            },
            InputEvent::KeyUp(key) => match Buttons::from_key(key) {
                Some(button) => {
                    self.controls.release(button);
                    Ok(true)
                }
                None => Ok(false),
            },
            InputEvent::MouseButtonDown if !self.mouse_captured => {
                self.mouse_captured = true;
                Ok(true)
            }
            InputEvent::MouseMotion { dx, dy } if self.mouse_captured => {
                let h = window_size.y.max(1) as f32;
                self.look(Vec2::new(dx / h, -dy / h))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn update(&mut self, elapsed: f32) -> Result<(), PlayError> {
        if self.reset.is_pending() {
            // movement is frozen until the reset
            self.reset.advance(elapsed);
            if self.reset.take_fired() {
                self.reset_game()?;
            }
        } else {
            self.walk_player(elapsed)?;
            self.arm_reset()?;
        }
        self.controls.end_tick();
        Ok(())
    }

    fn draw(&self, drawable_size: UVec2) -> Result<Frame, PlayError> {
        let size = drawable_size.max(UVec2::ONE).as_vec2();
        let aspect = size.x / size.y;
        let camera = self.scene.camera(self.player.camera)?;

        let mut lines = Vec::new();
        if self.config.show_walkmesh {
            for &tri in self.mesh.triangles() {
                let [a, b, c] = self.mesh.corners(tri);
                for (a, b) in [(a, b), (b, c), (c, a)] {
                    lines.push(WorldLine { a, b, color: WIREFRAME });
                }
            }
        }
        self.marker_lines(&mut lines)?;

        Ok(Frame {
            clear: clear_color(self.state),
            camera: CameraView {
                fovy: camera.fovy,
                aspect,
                near: camera.near,
                world_to_local: self.scene.world_to_local(self.player.camera)?,
            },
            light: LIGHT,
            lines,
            hud: hud_lines(self.state, aspect),
        })
    }
}
