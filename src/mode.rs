use glam::UVec2;

use crate::renderer::Frame;
use crate::sim::InputEvent;

/// One screen's worth of behaviour driven by the host frame loop.
///
/// Calls arrive on one thread in the order events → `update` → `draw`.
pub trait Mode {
    type Error;

    /// `Ok(true)` when the event was consumed.
    fn handle_event(&mut self, event: &InputEvent, window_size: UVec2) -> Result<bool, Self::Error>;

    /// Advance exactly one tick of `elapsed` seconds.
    fn update(&mut self, elapsed: f32) -> Result<(), Self::Error>;

    /// Describe the current state; never mutates it.
    fn draw(&self, drawable_size: UVec2) -> Result<Frame, Self::Error>;
}
