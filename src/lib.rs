//! Rules engine and computer opponent for a two-player, grid-based tactics
//! game. Everything lives in [`game`]; the Bevy host in `game::host` is the
//! only part that knows about frames.

pub mod game;

pub use game::*;
