//! A running world with its scripted viewer.

use std::sync::Arc;

use glam::Vec3;
use tessel_config::Config;
use tessel_terrain::{NoiseTerrainGenerator, TerrainParams};
use tessel_voxel::BlockRegistry;
use tessel_world::{GeneratingSource, RayHit, World, WorldSettings};

/// Viewer moving at constant velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewer {
    pub position: Vec3,
    /// Blocks per second.
    pub velocity: Vec3,
}

impl Viewer {
    pub fn new(position: [f32; 3], velocity: [f32; 3]) -> Self {
        Self {
            position: Vec3::from_array(position),
            velocity: Vec3::from_array(velocity),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

/// What one rendered frame would have drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub chunks: usize,
    pub quads: usize,
    pub solid_vertices: usize,
    pub water_vertices: usize,
    pub vertex_bytes: usize,
}

pub struct Session {
    world: World<NoiseTerrainGenerator>,
    viewer: Viewer,
    last_frame: FrameStats,
}

impl Session {
    /// Builds the registry, terrain generator, meshing workers and world
    /// described by `config`.
    pub fn new(config: &Config) -> Self {
        let registry = Arc::new(BlockRegistry::with_defaults());
        let generator = NoiseTerrainGenerator::new(TerrainParams::from_config(
            config.world.seed,
            &config.terrain,
        ));
        let source = Arc::new(GeneratingSource::new(generator));
        let settings = WorldSettings::from_config(config);
        tracing::info!(
            seed = config.world.seed,
            workers = settings.worker_count,
            budget = settings.in_flight_budget,
            "starting session"
        );

        let viewer = Viewer::new(config.viewer.start, config.viewer.velocity);
        let mut world = World::new(settings, registry, source);
        world.move_to(viewer.position.to_array());

        Self {
            world,
            viewer,
            last_frame: FrameStats::default(),
        }
    }

    /// One fixed step: move the viewer, then stream.
    pub fn update(&mut self, dt: f64) {
        self.viewer.advance(dt as f32);
        self.world.move_to(self.viewer.position.to_array());
        let report = self.world.update();
        if report.dropped > 0 {
            tracing::debug!(dropped = report.dropped, "discarded meshes for chunks left behind");
        }
    }

    /// Walks the visible chunks front to back and tallies their geometry.
    pub fn render(&mut self) -> FrameStats {
        let mut frame = FrameStats::default();
        self.world.render(|chunk| {
            frame.chunks += 1;
            frame.quads += chunk.mesh.quad_count();
            frame.solid_vertices += chunk.mesh.solid_vertices().len();
            frame.water_vertices += chunk.mesh.water_vertices().len();
            frame.vertex_bytes += chunk.mesh.vertex_bytes().len();
        });
        self.last_frame = frame;
        frame
    }

    /// First block straight below the viewer, if its chunk is loaded.
    pub fn probe_ground(&self, max_distance: f32) -> Option<RayHit> {
        self.world
            .raycast(self.viewer.position.to_array(), [0.0, -1.0, 0.0], max_distance)
    }

    /// Logs the world and frame statistics.
    pub fn log_summary(&self, sim_time: f64) {
        let frame = self.last_frame;
        tracing::info!(
            sim_time_s = sim_time,
            visible_chunks = frame.chunks,
            visible_quads = frame.quads,
            water_vertices = frame.water_vertices,
            "{}",
            self.world.stats()
        );
        if let Some(hit) = self.probe_ground(256.0) {
            tracing::info!(block = ?hit.block, id = hit.id.0, distance = hit.distance, "ground below viewer");
        }
    }

    pub fn world(&self) -> &World<NoiseTerrainGenerator> {
        &self.world
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    pub fn shutdown(&mut self) {
        self.world.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn small_config() -> Config {
        let mut config = Config::default();
        config.world.render_distance = 1;
        config.world.unload_distance = 2;
        config.meshing.worker_count = 2;
        config.meshing.in_flight_budget = 8;
        config
    }

    #[test]
    fn test_viewer_advances() {
        let mut viewer = Viewer::new([0.0, 10.0, 0.0], [2.0, 0.0, -4.0]);
        viewer.advance(0.5);
        assert_eq!(viewer.position, Vec3::new(1.0, 10.0, -2.0));
    }

    #[test]
    fn test_session_streams_and_renders() {
        let mut config = small_config();
        config.viewer.velocity = [0.0; 3];
        let mut session = Session::new(&config);

        let start = Instant::now();
        loop {
            session.update(1.0 / 60.0);
            let frame = session.render();
            if frame.chunks == session.world().chunks_in_view() {
                break;
            }
            assert!(start.elapsed().as_secs() < 20, "Timed out streaming chunks");
            std::thread::sleep(Duration::from_millis(1));
        }

        let frame = session.last_frame();
        assert_eq!(frame.chunks, 7);
        assert_eq!(frame.vertex_bytes, (frame.solid_vertices + frame.water_vertices) * 8);
        assert_eq!(frame.quads * 6, frame.solid_vertices + frame.water_vertices);
        session.shutdown();
    }

    #[test]
    fn test_probe_ground_finds_terrain() {
        let mut config = small_config();
        config.viewer.velocity = [0.0; 3];
        // Gentle terrain, viewer a couple of blocks above its highest point.
        config.terrain.amplitude = 4.0;
        let above = config.terrain.base_height + config.terrain.amplitude + 2.5;
        config.viewer.start = [0.5, above as f32, -0.5];
        let mut session = Session::new(&config);

        let start = Instant::now();
        while session.world().loaded_count() < session.world().chunks_in_view() {
            session.update(1.0 / 60.0);
            assert!(start.elapsed().as_secs() < 20, "Timed out streaming chunks");
            std::thread::sleep(Duration::from_millis(1));
        }

        let hit = session.probe_ground(32.0).expect("terrain below the viewer");
        assert!(!hit.id.is_empty());
        assert_eq!(hit.normal, [0, 1, 0]);
    }
}
