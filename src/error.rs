// One error type for the whole crate.
// Every variant states *where* things went wrong.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Creating the window failed
    #[error("window init error: {0}")]
    WindowInit(String),
    // Updating the window buffer failed
    #[error("window update error: {0}")]
    WindowUpdate(String),
    // Opening/starting the colour camera failed
    #[error("camera init error: {0}")]
    CameraInit(String),
    // Grabbing/decoding a colour frame failed
    #[error("camera frame error: {0}")]
    CameraFrame(String),

    // Reading the TOML config from disk failed
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    // The TOML was readable but not a valid config
    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    // Values parsed but make no sense together (e.g. far radius > near radius)
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // Depth/body-index buffers don't match the declared frame size
    #[error("frame shape mismatch: expected {expected} samples, got depth={depth} body_index={body_index}")]
    FrameShape {
        expected: usize,
        depth: usize,
        body_index: usize,
    },
    // The depth source thread went away
    #[error("depth sensor stopped: {0}")]
    SensorStopped(String),

    // A frame was pushed after the collision ended the game
    #[error("session is over (final score {final_score})")]
    SessionOver { final_score: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
