//! # dodge-square
//!
//! Depth-camera hand tracking driving a small dodge game: the player's hand
//! steers a circle around the view while a square sweeps across it, faster
//! every time it wraps. Touch the square and the game is over.
//!
//! Per frame:
//!
//! | Stage | Module | Output |
//! |---|---|---|
//! | Hand segmentation | [`segment`] | foreground mask |
//! | Contour analysis | [`contour`] | hand centre + average depth |
//! | Control mapping | [`control`] | avatar position, size, colour |
//! | Obstacle motion | [`obstacle`] | square position, respawns |
//! | Game loop | [`game`] | score, collision, game over |
//!
//! [`game::GameSession`] strings the stages together. Sensor input lives in
//! [`sensor`], drawing in [`draw`] and [`render`].

pub mod config;
pub mod contour;
pub mod control;
pub mod cue;
pub mod draw;
pub mod error;
pub mod game;
pub mod obstacle;
pub mod render;
pub mod segment;
pub mod sensor;
pub mod types;

#[cfg(feature = "camera")]
pub mod camera;

pub use config::Config;
pub use error::{Error, Result};
pub use game::{GameSession, GameStatus};
