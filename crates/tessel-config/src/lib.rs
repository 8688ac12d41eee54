//! Runtime configuration for the tessel voxel streamer.
//!
//! Settings persist to disk as `config.ron`. Every section carries serde
//! defaults, so older or partial files keep loading. Command-line flags
//! override whatever the file says.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, MeshingConfig, TerrainConfig, ViewerConfig, WorldConfig,
};
pub use error::ConfigError;
