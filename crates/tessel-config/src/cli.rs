//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Command-line arguments of the `tessel` binary.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "tessel", about = "Headless voxel chunk streamer and mesher")]
pub struct CliArgs {
    /// Render distance in chunks.
    #[arg(long)]
    pub render_distance: Option<u32>,

    /// Eviction distance in chunks.
    #[arg(long)]
    pub unload_distance: Option<u32>,

    /// Meshing worker threads (0 = one per CPU).
    #[arg(long)]
    pub workers: Option<usize>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of fixed-timestep updates to simulate.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(rd) = args.render_distance {
            self.world.render_distance = rd;
        }
        if let Some(ud) = args.unload_distance {
            self.world.unload_distance = ud;
        }
        if let Some(workers) = args.workers {
            self.meshing.worker_count = workers;
        }
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(ticks) = args.ticks {
            self.viewer.ticks = ticks;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            render_distance: Some(3),
            workers: Some(2),
            seed: Some(99),
            log_level: Some("debug".to_string()),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.render_distance, 3);
        assert_eq!(config.meshing.worker_count, 2);
        assert_eq!(config.world.seed, 99);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.world.unload_distance, 12);
        assert_eq!(config.viewer.ticks, 600);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "tessel",
            "--render-distance",
            "4",
            "--ticks",
            "120",
            "--config",
            "/tmp/tessel",
        ]);
        assert_eq!(args.render_distance, Some(4));
        assert_eq!(args.ticks, Some(120));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/tessel")));
        assert_eq!(args.seed, None);
    }
}
