mod error;
mod map;
mod unit;
mod player;
mod combat;
mod movement;
mod scenario;
mod turn;
mod ai;
mod statistics;
mod config;
mod save;
mod host;

pub use error::*;
pub use map::*;
pub use unit::*;
pub use player::*;
pub use combat::*;
pub use movement::*;
pub use scenario::*;
pub use turn::*;
pub use ai::*;
pub use statistics::*;
pub use config::*;
pub use save::*;
pub use host::*;
