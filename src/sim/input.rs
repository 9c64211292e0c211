use bitflags::bitflags;
use glam::Vec2;

/// Keys the level reacts to; everything else arrives as `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    A,
    D,
    W,
    S,
    Escape,
    Other,
}

/// Host-independent input, already translated from the window system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseButtonDown,
    /// relative motion in pixels, +y is down the screen
    MouseMotion { dx: f32, dy: f32 },
}

bitflags! {
    /// Movement buttons currently held.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Buttons: u8 {
        const LEFT  = 0b0001;
        const RIGHT = 0b0010;
        const UP    = 0b0100;
        const DOWN  = 0b1000;
    }
}

impl Buttons {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::A => Some(Buttons::LEFT),
            Key::D => Some(Buttons::RIGHT),
            Key::W => Some(Buttons::UP),
            Key::S => Some(Buttons::DOWN),
            Key::Escape | Key::Other => None,
        }
    }
}

/// Held state plus a press counter per button, both fed by key events.
#[derive(Clone, Copy, Debug, Default)]
pub struct Controls {
    held: Buttons,
    downs: [u8; 4],
}

impl Controls {
    pub fn press(&mut self, button: Buttons) {
        self.held |= button;
        for (i, slot) in self.downs.iter_mut().enumerate() {
            if button.bits() & (1u8 << i) != 0 {
                *slot = slot.saturating_add(1);
            }
        }
    }

    pub fn release(&mut self, button: Buttons) {
        self.held -= button;
    }

    /// Key-down events seen for `button` since the last [`Controls::end_tick`].
    pub fn downs(&self, button: Buttons) -> u8 {
        (0..4)
            .filter(|&i| button.bits() & (1u8 << i) != 0)
            .map(|i| self.downs[i])
            .sum()
    }

    /// Clear the press counters; held state survives.
    pub fn end_tick(&mut self) {
        self.downs = [0; 4];
    }

    /// Unit-length (or zero) movement direction in player space:
    /// x = strafe right, y = forward.  Opposing buttons cancel.  A button
    /// tapped and released within one tick still counts for that tick.
    pub fn move_axis(&self) -> Vec2 {
        let active = |b: Buttons| self.held.contains(b) || self.downs(b) > 0;
        let axis = |neg: Buttons, pos: Buttons| match (active(neg), active(pos)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Vec2::new(
            axis(Buttons::LEFT, Buttons::RIGHT),
            axis(Buttons::DOWN, Buttons::UP),
        )
        .normalize_or_zero()
    }
}
