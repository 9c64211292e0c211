mod input;
mod play;

pub mod layout;
pub mod walker;

pub use input::{Buttons, Controls, InputEvent, Key};
pub use layout::{LevelState, ResetTimer, pos_to_layout};
pub use play::{PALETTE, PlayError, PlayMode, Player};
pub use walker::{WalkResult, walk};
