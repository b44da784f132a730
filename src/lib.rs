pub mod autoplay;
pub mod board;
pub mod catalog;
pub mod config;
pub mod dice;
pub mod events;
pub mod rng;
pub mod session;
pub mod snapshot;
pub mod targets;

pub use config::GameConfig;
pub use session::{LevelSession, LevelStatus, Rejection};
