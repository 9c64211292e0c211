//! Rendering abstraction layer.
//!
//! *Game logic never touches a pixel buffer directly.*
//! `PlayMode::draw` produces a [`Frame`] (plain data) and hands it to a type
//! that implements [`Renderer`].
//!
//! * Back-ends can be swapped without changing game logic.
//! * A helper blanket-impl [`RendererExt`] adds `draw_frame` so call-sites
//!   stay short.

use glam::{Affine3A, Mat4, Vec2, Vec3};
use smallvec::SmallVec;

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

/// Pack a linear `[0, 1]` colour into [`Rgba`].
#[inline]
pub fn pack_rgb(c: Vec3) -> Rgba {
    let q = (c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    ((q.x as u32) << 16) | ((q.y as u32) << 8) | q.z as u32
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub world_to_local: Affine3A,
}

impl CameraView {
    /// Infinite far plane, camera looks down local -Z.
    #[inline]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_infinite_rh(self.fovy, self.aspect, self.near)
    }

    #[inline]
    pub fn world_to_clip(&self) -> Mat4 {
        self.projection() * Mat4::from(self.world_to_local)
    }
}

/// Directional light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub direction: Vec3,
    pub energy: Vec3,
}

/// World-space segment, e.g. one walk-mesh edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldLine {
    pub a: Vec3,
    pub b: Vec3,
    pub color: Rgba,
}

/// One line of overlay text.  `anchor` is the lower-left corner in
/// aspect-corrected screen units (x in `[-aspect, aspect]`, y in `[-1, 1]`).
#[derive(Clone, Debug, PartialEq)]
pub struct HudText {
    pub text: String,
    pub anchor: Vec2,
    pub height: f32,
    pub color: Rgba,
}

pub type HudLines = SmallVec<[HudText; 2]>;

/// Everything a back-end needs to show one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub clear: Vec3,
    pub camera: CameraView,
    pub light: Light,
    pub lines: Vec<WorldLine>,
    pub hud: HudLines,
}

/// A renderer that owns an internal scratch buffer for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
/// Software callers typically forward it to their window-manager.
pub trait Renderer {
    /// (Re)allocate internal scratch for the requested resolution and clear it.
    fn begin_frame(&mut self, width: usize, height: usize, clear: Rgba);

    /// Rasterise one world-space segment through `world_to_clip`.
    fn draw_line(&mut self, world_to_clip: &Mat4, line: &WorldLine);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

/// Convenience blanket-impl with a one-liner `draw_frame` adaptor.
pub trait RendererExt: Renderer {
    fn draw_frame<F>(&mut self, width: usize, height: usize, frame: &Frame, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        self.begin_frame(width, height, pack_rgb(frame.clear));
        let world_to_clip = frame.camera.world_to_clip();
        for line in &frame.lines {
            self.draw_line(&world_to_clip, line);
        }
        self.end_frame(submit);
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}

pub mod software;
