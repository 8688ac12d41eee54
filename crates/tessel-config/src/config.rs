//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Chunk streaming settings.
    pub world: WorldConfig,
    /// Meshing worker pool settings.
    pub meshing: MeshingConfig,
    /// Terrain generator parameters.
    pub terrain: TerrainConfig,
    /// Scripted viewer used by the headless binary.
    pub viewer: ViewerConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Chunk streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Radius of the loaded sphere, in chunks.
    pub render_distance: u32,
    /// Chunks farther than this from the viewer are evicted.
    pub unload_distance: u32,
    /// Maximum mesh results integrated per update.
    pub results_per_update: usize,
    /// World seed handed to the terrain generator.
    pub seed: u64,
}

/// Meshing worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshingConfig {
    /// Number of worker threads (0 = one per logical CPU).
    pub worker_count: usize,
    /// Maximum number of chunks queued or being meshed at once.
    pub in_flight_budget: usize,
}

/// Terrain generator parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Mean surface height in blocks.
    pub base_height: f64,
    /// Maximum deviation from `base_height` in blocks.
    pub amplitude: f64,
    /// Frequency of the first noise octave (per block).
    pub frequency: f64,
    /// Number of fBm octaves.
    pub octaves: u32,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Water fills empty cells below this height.
    pub sea_level: i32,
    /// Probability of short grass on a grassy column (0.0 - 1.0).
    pub foliage_chance: f64,
}

/// Scripted viewer for headless runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Starting position in world space (Y up).
    pub start: [f32; 3],
    /// Movement in blocks per second.
    pub velocity: [f32; 3],
    /// Number of fixed-timestep updates to simulate.
    pub ticks: u64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            render_distance: 6,
            unload_distance: 12,
            results_per_update: 10,
            seed: 23456,
        }
    }
}

impl WorldConfig {
    /// Eviction radius, never smaller than the render distance.
    pub fn effective_unload_distance(&self) -> u32 {
        self.unload_distance.max(self.render_distance)
    }
}

impl Default for MeshingConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            in_flight_budget: 64,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            base_height: 24.0,
            amplitude: 40.0,
            frequency: 0.01,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            sea_level: 20,
            foliage_chance: 0.02,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            start: [0.0, 48.0, 0.0],
            velocity: [16.0, 0.0, -8.0],
            ticks: 600,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("render_distance: 6"));
        assert!(ron_str.contains("seed: 23456"));
        assert!(ron_str.contains("sea_level: 20"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(world: (render_distance: 3), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.world.render_distance, 3);
        assert_eq!(config.world.unload_distance, 12);
        assert_eq!(config.terrain, TerrainConfig::default());
        assert_eq!(config.meshing, MeshingConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_unload_distance_never_below_render_distance() {
        let world = WorldConfig {
            render_distance: 8,
            unload_distance: 2,
            ..WorldConfig::default()
        };
        assert_eq!(world.effective_unload_distance(), 8);
        assert_eq!(WorldConfig::default().effective_unload_distance(), 12);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.world.seed = 7;
        config.terrain.octaves = 3;
        config.viewer.velocity = [1.0, 2.0, 3.0];

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tessel");
        let config = Config::load_or_create(&nested).unwrap();
        assert_eq!(config, Config::default());
        assert!(nested.join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.meshing.in_flight_budget = 8;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().meshing.in_flight_budget, 8);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_file_produces_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// top comment\n(\n  // inner comment\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
