//! The tessel headless streamer: wires configuration, logging, terrain, the
//! meshing pipeline and the world together and drives them from a
//! fixed-timestep loop.

pub mod game_loop;
pub mod platform;
pub mod session;

pub use game_loop::{FIXED_DT, FrameTiming, GameLoop, MAX_FRAME_TIME};
pub use platform::{APP_NAME, PlatformDirs, PlatformError};
pub use session::{FrameStats, Session, Viewer};

/// Startup failures of the binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Config(#[from] tessel_config::ConfigError),
}
