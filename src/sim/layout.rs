//! Level state: which checkerboard cell the player stands on, and the
//! pause-then-reset timer that follows a game over or a win.

use glam::{Vec2, Vec3};

pub const GRID_SIZE: usize = 4;

/// Raw cell code as stored in [`LAYOUT`].
pub type StateCode = i16;

pub const GAME_OVER: StateCode = -1;
pub const DESTINATION: StateCode = 100;

/// Number of distinct floor shades; floor codes are `0 .. FLOOR_SHADES`.
pub const FLOOR_SHADES: usize = 5;

/// Cell codes.  Row 0 is the far edge of the board; the player spawns in
/// the bottom-left cell (`LAYOUT[GRID_SIZE - 1][0]`).
pub const LAYOUT: [[StateCode; GRID_SIZE]; GRID_SIZE] = [
    [1, 1, 1, DESTINATION],
    [GAME_OVER, 2, GAME_OVER, 2],
    [1, 3, 3, GAME_OVER],
    [0, 1, GAME_OVER, 2],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelState {
    /// ordinary cell, value is the floor shade
    Floor(u8),
    GameOver,
    Destination,
}

impl LevelState {
    /// Classify a table code.
    ///
    /// Panics on codes that are neither a floor shade nor a sentinel: such a
    /// code can only come from a broken table.
    pub fn from_code(code: StateCode) -> Self {
        match code {
            GAME_OVER => LevelState::GameOver,
            DESTINATION => LevelState::Destination,
            _ => {
                assert!(
                    (0..FLOOR_SHADES as StateCode).contains(&code),
                    "layout code {code} is out of range"
                );
                LevelState::Floor(code as u8)
            }
        }
    }

    pub fn code(self) -> StateCode {
        match self {
            LevelState::Floor(n) => n as StateCode,
            LevelState::GameOver => GAME_OVER,
            LevelState::Destination => DESTINATION,
        }
    }

    /// Game over or destination: both end the episode.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, LevelState::GameOver | LevelState::Destination)
    }
}

/// Grid cell `(column, row)` under `position`, clamped onto the board.
///
/// Row 0 is the row nearest `origin`; both axes grow along +X/+Y.
pub fn cell_of(position: Vec3, origin: Vec3, cell_size: f32) -> (usize, usize) {
    let max = (GRID_SIZE - 1) as f32;
    let q = ((position - origin).truncate() / cell_size)
        .floor()
        .clamp(Vec2::ZERO, Vec2::splat(max));
    (q.x as usize, q.y as usize)
}

/// Map a world position to the state of the cell it falls in.
pub fn pos_to_layout(position: Vec3, origin: Vec3, cell_size: f32) -> LevelState {
    let (col, row) = cell_of(position, origin, cell_size);
    LevelState::from_code(LAYOUT[GRID_SIZE - 1 - row][col])
}

/// `(column, row)` of the first destination cell, in [`cell_of`] terms.
pub fn destination_cell() -> Option<(usize, usize)> {
    LAYOUT.iter().enumerate().find_map(|(r, cells)| {
        cells
            .iter()
            .position(|&code| code == DESTINATION)
            .map(|col| (col, GRID_SIZE - 1 - r))
    })
}

/*──────────────────────────── reset timer ────────────────────────────*/

/// Countdown between the end of an episode and the reset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ResetTimer {
    #[default]
    Idle,
    Armed {
        remaining: f32,
    },
    /// ran out during the last `advance`; consumed by `take_fired`
    Firing,
}

impl ResetTimer {
    /// Start the countdown.  Only an idle timer can be armed, so each
    /// episode arms at most once.
    pub fn arm(&mut self, delay: f32) -> bool {
        if *self == ResetTimer::Idle {
            *self = ResetTimer::Armed { remaining: delay };
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        *self != ResetTimer::Idle
    }

    pub fn advance(&mut self, elapsed: f32) {
        if let ResetTimer::Armed { remaining } = self {
            *remaining -= elapsed;
            if *remaining <= 0.0 {
                *self = ResetTimer::Firing;
            }
        }
    }

    /// `true` once per expiry; returns the timer to idle.
    pub fn take_fired(&mut self) -> bool {
        if *self == ResetTimer::Firing {
            *self = ResetTimer::Idle;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Vec3 = Vec3::new(-10.0, -10.0, 0.0);
    const CELL: f32 = 5.0;

    fn at(x: f32, y: f32) -> LevelState {
        pos_to_layout(Vec3::new(x, y, 0.0), ORIGIN, CELL)
    }

    #[test]
    fn start_cell_is_shade_zero() {
        assert_eq!(at(-10.0, -10.0), LevelState::Floor(0));
        assert_eq!(at(-7.5, -7.5), LevelState::Floor(0));
    }

    #[test]
    fn table_rows_are_flipped() {
        // far corner of the board is the destination
        assert_eq!(at(7.5, 7.5), LevelState::Destination);
        // third column of the bottom row
        assert_eq!(at(2.5, -7.5), LevelState::GameOver);
        // first column, third row from the start
        assert_eq!(at(-7.5, 2.5), LevelState::GameOver);
        assert_eq!(at(-2.5, -2.5), LevelState::Floor(3));
        assert_eq!(at(-2.5, 2.5), LevelState::Floor(2));
    }

    #[test]
    fn lookup_is_idempotent() {
        let p = Vec3::new(3.3, -1.2, 0.4);
        assert_eq!(pos_to_layout(p, ORIGIN, CELL), pos_to_layout(p, ORIGIN, CELL));
    }

    #[test]
    fn off_board_positions_clamp_to_edge_cells() {
        assert_eq!(at(-500.0, -500.0), at(-10.0, -10.0));
        assert_eq!(at(500.0, 500.0), at(7.5, 7.5));
        assert_eq!(at(500.0, -500.0), at(7.5, -7.5));
        assert_eq!(at(-500.0, 500.0), at(-7.5, 7.5));
        assert_eq!(cell_of(Vec3::splat(1e6), ORIGIN, CELL), (3, 3));
        assert_eq!(cell_of(Vec3::splat(-1e6), ORIGIN, CELL), (0, 0));
    }

    #[test]
    fn destination_is_far_corner() {
        assert_eq!(destination_cell(), Some((3, 3)));
    }

    #[test]
    fn codes_round_trip_through_states() {
        for row in LAYOUT {
            for code in row {
                assert_eq!(LevelState::from_code(code).code(), code);
            }
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn unknown_code_is_a_contract_violation() {
        LevelState::from_code(42);
    }

    #[test]
    fn timer_arms_once_and_fires_once() {
        let mut timer = ResetTimer::default();
        assert!(!timer.is_pending());
        assert!(timer.arm(2.0));
        assert!(!timer.arm(2.0), "re-armed while pending");

        timer.advance(1.5);
        assert!(!timer.take_fired());
        assert!(timer.is_pending());

        timer.advance(0.6);
        assert_eq!(timer, ResetTimer::Firing);
        assert!(timer.take_fired());
        assert!(!timer.take_fired());
        assert!(!timer.is_pending());
        assert!(timer.arm(2.0));
    }
}
