//! The chunk map around the viewer and its request/load/evict cycle.
//!
//! Each chunk key is in one of three states:
//!
//! ```text
//!  (absent) --enters ring--> Requested --mesh result--> Loaded
//!     ^                          |                        |
//!     +------ beyond unload distance on a viewer move ----+
//! ```
//!
//! Results that arrive for a key that was evicted, re-requested, or already
//! loaded are dropped.

use std::fmt;
use std::sync::Arc;

use glam::{IVec3, Vec3};
use rustc_hash::FxHashMap;
use tessel_config::Config;
use tessel_mesh::{MeshData, MeshingPipeline, MeshingResult, MeshingTask};
use tessel_voxel::{
    BlockBounds, BlockId, BlockRegistry, ChunkCoord, ChunkGenerator, ChunkGrid, ChunkSource,
};

use crate::load_queue::ChunkLoadQueue;
use crate::ring::RenderRing;
use crate::source::GeneratingSource;

/// Streaming parameters for a [`World`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSettings {
    /// Radius of the requested sphere, in chunks.
    pub render_distance: u32,
    /// Loaded chunks farther than this are evicted when the viewer moves.
    pub unload_distance: u32,
    /// Maximum mesh results integrated per [`World::update`].
    pub results_per_update: usize,
    pub worker_count: usize,
    /// Maximum chunks queued on or being processed by the pipeline.
    pub in_flight_budget: usize,
}

impl WorldSettings {
    pub fn from_config(config: &Config) -> Self {
        let worker_count = match config.meshing.worker_count {
            0 => default_worker_count(),
            n => n,
        };
        Self {
            render_distance: config.world.render_distance,
            unload_distance: config.world.effective_unload_distance(),
            results_per_update: config.world.results_per_update.max(1),
            worker_count,
            in_flight_budget: config.meshing.in_flight_budget.max(1),
        }
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// One worker per logical CPU, leaving one for the caller's thread.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// A chunk whose mesh has arrived.
#[derive(Clone, Debug)]
pub struct LoadedChunk {
    pub coord: ChunkCoord,
    pub grid: Arc<ChunkGrid>,
    pub mesh: MeshData,
    /// Occupied region of `grid`, `None` for an all-empty chunk.
    pub bounds: Option<BlockBounds>,
}

/// State of a chunk key that is present in the map. Absent keys are
/// unrequested.
#[derive(Clone, Debug)]
pub enum ChunkState {
    /// Waiting in the load queue or on the pipeline.
    Requested { generation: u64 },
    Loaded(LoadedChunk),
}

impl ChunkState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ChunkState::Loaded(_))
    }
}

/// First non-empty block hit by [`World::raycast`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// World block coordinate (`Y` up).
    pub block: [i32; 3],
    pub id: BlockId,
    /// Distance along the normalized ray to the entry point.
    pub distance: f32,
    /// Face normal of the entered face, zero when the ray starts inside.
    pub normal: [i32; 3],
}

/// What one [`World::update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub evicted: usize,
    pub requested: usize,
    pub submitted: usize,
    pub integrated: usize,
    pub dropped: usize,
}

/// Snapshot of the world's bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub viewer: ChunkCoord,
    pub loaded: usize,
    pub requested: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub cached: usize,
    pub quads: usize,
    pub vertex_bytes: usize,
    pub dropped_results: u64,
}

impl fmt::Display for WorldStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "viewer {} | loaded {} requested {} (queued {}, in flight {}) | cached {} | {} quads, {} KiB",
            self.viewer,
            self.loaded,
            self.requested,
            self.queued,
            self.in_flight,
            self.cached,
            self.quads,
            self.vertex_bytes / 1024,
        )
    }
}

/// Chunks streamed around a moving viewer.
pub struct World<G: ChunkGenerator + 'static> {
    settings: WorldSettings,
    ring: RenderRing,
    source: Arc<GeneratingSource<G>>,
    pipeline: MeshingPipeline,
    chunks: FxHashMap<ChunkCoord, ChunkState>,
    queue: ChunkLoadQueue,
    position: Vec3,
    viewer_chunk: ChunkCoord,
    /// Set when the viewer entered a new chunk since the last update.
    viewer_moved: bool,
    next_generation: u64,
    dropped_results: u64,
}

impl<G: ChunkGenerator + 'static> World<G> {
    /// Starts the meshing workers. The viewer begins at the origin.
    pub fn new(
        settings: WorldSettings,
        registry: Arc<BlockRegistry>,
        source: Arc<GeneratingSource<G>>,
    ) -> Self {
        let settings = WorldSettings {
            unload_distance: settings.unload_distance.max(settings.render_distance),
            ..settings
        };
        let pipeline = MeshingPipeline::new(
            settings.worker_count,
            settings.in_flight_budget,
            registry,
            Arc::clone(&source) as Arc<dyn ChunkSource>,
        );
        let ring = RenderRing::new(settings.render_distance);
        tracing::info!(
            render_distance = settings.render_distance,
            unload_distance = settings.unload_distance,
            chunks_in_view = ring.len(),
            "world created"
        );

        Self {
            settings,
            ring,
            source,
            pipeline,
            chunks: FxHashMap::default(),
            queue: ChunkLoadQueue::new(),
            position: Vec3::ZERO,
            viewer_chunk: ChunkCoord::default(),
            viewer_moved: true,
            next_generation: 0,
            dropped_results: 0,
        }
    }

    /// Moves the viewer to a world-space position (`Y` up).
    pub fn move_to(&mut self, position: [f32; 3]) {
        let position = Vec3::from_array(position);
        if !position.is_finite() {
            tracing::warn!(?position, "ignoring non-finite viewer position");
            return;
        }
        self.position = position;
        let chunk = ChunkCoord::from_world_block(position.floor().as_ivec3().to_array());
        if chunk != self.viewer_chunk {
            tracing::info!(from = %self.viewer_chunk, to = %chunk, "viewer changed chunk");
            self.viewer_chunk = chunk;
            self.viewer_moved = true;
        }
    }

    /// Advances streaming by one step. Never blocks on the workers.
    ///
    /// 1. After a chunk change, evicts far chunks and requests the new ring.
    /// 2. Submits queued requests while the pipeline has budget.
    /// 3. Integrates up to `results_per_update` finished meshes.
    pub fn update(&mut self) -> UpdateReport {
        let mut report = UpdateReport::default();

        if self.viewer_moved {
            self.viewer_moved = false;
            report.evicted = self.evict_far_chunks();
            report.requested = self.request_ring();
        }

        report.submitted = self.submit_queued();

        for result in self.pipeline.drain_up_to(self.settings.results_per_update) {
            if self.integrate(result) {
                report.integrated += 1;
            } else {
                report.dropped += 1;
            }
        }

        report
    }

    fn evict_far_chunks(&mut self) -> usize {
        let center = self.viewer_chunk;
        let limit = i64::from(self.settings.unload_distance).pow(2);
        let before = self.chunks.len();

        self.chunks
            .retain(|coord, _| coord.distance_sq(center) <= limit);
        self.queue
            .retain(|coord| coord.distance_sq(center) <= limit);
        self.queue.reprioritize(center);

        // Kept chunks may still need their neighbors one step further out.
        let cache_limit = i64::from(self.settings.unload_distance + 2).pow(2);
        let uncached = self.source.evict_outside(center, cache_limit);

        let evicted = before - self.chunks.len();
        if evicted > 0 || uncached > 0 {
            tracing::debug!(evicted, uncached, %center, "evicted far chunks");
        }
        evicted
    }

    fn request_ring(&mut self) -> usize {
        let center = self.viewer_chunk;
        let mut requested = 0;
        for coord in self.ring.coords_around(center) {
            if self.chunks.contains_key(&coord) {
                continue;
            }
            let generation = self.next_generation;
            self.next_generation += 1;
            self.chunks.insert(coord, ChunkState::Requested { generation });
            self.queue.enqueue(coord, coord.distance_sq(center));
            requested += 1;
        }
        requested
    }

    fn submit_queued(&mut self) -> usize {
        let mut submitted = 0;
        while self.pipeline.has_capacity() {
            let Some((dist_sq, coord)) = self.queue.dequeue() else {
                break;
            };
            let Some(&ChunkState::Requested { generation }) = self.chunks.get(&coord) else {
                continue;
            };
            if !self.pipeline.submit(MeshingTask { coord, generation }) {
                self.queue.enqueue(coord, dist_sq);
                break;
            }
            submitted += 1;
        }
        submitted
    }

    /// Applies a finished mesh. Returns `false` if the result was dropped.
    fn integrate(&mut self, result: MeshingResult) -> bool {
        let coord = result.coord;
        let expected = match self.chunks.get(&coord) {
            Some(&ChunkState::Requested { generation }) => Some(generation),
            Some(ChunkState::Loaded(_)) => {
                tracing::warn!(%coord, "dropping mesh for already loaded chunk");
                None
            }
            None => {
                tracing::debug!(%coord, "dropping mesh for evicted chunk");
                None
            }
        };

        match expected {
            Some(generation) if generation == result.generation => {
                tracing::debug!(
                    %coord,
                    quads = result.mesh.quad_count(),
                    elapsed_us = result.elapsed.as_micros() as u64,
                    "chunk loaded"
                );
                let bounds = result.chunk.find_non_empty_bounds();
                self.chunks.insert(
                    coord,
                    ChunkState::Loaded(LoadedChunk {
                        coord,
                        grid: result.chunk,
                        mesh: result.mesh,
                        bounds,
                    }),
                );
                true
            }
            stale => {
                if let Some(generation) = stale {
                    tracing::debug!(%coord, generation, stale = result.generation, "dropping stale mesh");
                }
                self.dropped_results += 1;
                false
            }
        }
    }

    /// Visits loaded chunks in the render distance, nearest first.
    /// Returns the number of chunks visited.
    pub fn render(&self, mut visit: impl FnMut(&LoadedChunk)) -> usize {
        let mut visited = 0;
        for coord in self.ring.coords_around(self.viewer_chunk) {
            if let Some(ChunkState::Loaded(chunk)) = self.chunks.get(&coord) {
                visit(chunk);
                visited += 1;
            }
        }
        visited
    }

    /// Block at a world block coordinate, `EMPTY` where nothing is loaded.
    pub fn block_at(&self, block: [i32; 3]) -> BlockId {
        let coord = ChunkCoord::from_world_block(block);
        match self.chunks.get(&coord) {
            Some(ChunkState::Loaded(chunk)) => {
                let (h, x, y) = ChunkCoord::local_of_world_block(block);
                chunk.grid.get(h, x, y)
            }
            _ => BlockId::EMPTY,
        }
    }

    /// Walks the voxels along a ray (Amanatides-Woo DDA) and returns the
    /// first non-empty block within `max_distance`.
    pub fn raycast(&self, origin: [f32; 3], direction: [f32; 3], max_distance: f32) -> Option<RayHit> {
        let origin = Vec3::from_array(origin);
        let dir = Vec3::from_array(direction).normalize_or_zero();
        if dir == Vec3::ZERO || !origin.is_finite() {
            return None;
        }

        let mut cell = origin.floor().as_ivec3();
        let step = IVec3::new(axis_step(dir.x), axis_step(dir.y), axis_step(dir.z));
        let t_delta = Vec3::new(axis_delta(dir.x), axis_delta(dir.y), axis_delta(dir.z));
        let mut t_max = Vec3::new(
            first_crossing(origin.x, cell.x, dir.x, t_delta.x),
            first_crossing(origin.y, cell.y, dir.y, t_delta.y),
            first_crossing(origin.z, cell.z, dir.z, t_delta.z),
        );
        let mut t = 0.0;
        let mut normal = IVec3::ZERO;

        while t <= max_distance {
            let id = self.block_at(cell.to_array());
            if !id.is_empty() {
                return Some(RayHit {
                    block: cell.to_array(),
                    id,
                    distance: t,
                    normal: normal.to_array(),
                });
            }

            if t_max.x < t_max.y && t_max.x < t_max.z {
                cell.x += step.x;
                t = t_max.x;
                t_max.x += t_delta.x;
                normal = IVec3::new(-step.x, 0, 0);
            } else if t_max.y < t_max.z {
                cell.y += step.y;
                t = t_max.y;
                t_max.y += t_delta.y;
                normal = IVec3::new(0, -step.y, 0);
            } else {
                cell.z += step.z;
                t = t_max.z;
                t_max.z += t_delta.z;
                normal = IVec3::new(0, 0, -step.z);
            }
        }

        None
    }

    /// State of `coord`, `None` when it is not requested.
    pub fn chunk_state(&self, coord: ChunkCoord) -> Option<&ChunkState> {
        self.chunks.get(&coord)
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.values().filter(|s| s.is_loaded()).count()
    }

    pub fn requested_count(&self) -> usize {
        self.chunks.len() - self.loaded_count()
    }

    /// Number of chunks in the render distance.
    pub fn chunks_in_view(&self) -> usize {
        self.ring.len()
    }

    pub fn viewer_chunk(&self) -> ChunkCoord {
        self.viewer_chunk
    }

    pub fn position(&self) -> [f32; 3] {
        self.position.to_array()
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn source(&self) -> &GeneratingSource<G> {
        &self.source
    }

    pub fn stats(&self) -> WorldStats {
        let mut stats = WorldStats {
            viewer: self.viewer_chunk,
            queued: self.queue.len(),
            in_flight: self.pipeline.in_flight_count(),
            cached: self.source.cached_count(),
            dropped_results: self.dropped_results,
            ..WorldStats::default()
        };
        for state in self.chunks.values() {
            match state {
                ChunkState::Requested { .. } => stats.requested += 1,
                ChunkState::Loaded(chunk) => {
                    stats.loaded += 1;
                    stats.quads += chunk.mesh.quad_count();
                    stats.vertex_bytes += chunk.mesh.vertex_bytes().len();
                }
            }
        }
        stats
    }

    /// Stops the meshing workers. Pending requests stay `Requested`.
    pub fn shutdown(&mut self) {
        self.pipeline.shutdown();
    }
}

fn axis_step(d: f32) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

fn axis_delta(d: f32) -> f32 {
    if d != 0.0 { (1.0 / d).abs() } else { f32::INFINITY }
}

/// Ray distance to the first cell boundary on one axis.
fn first_crossing(origin: f32, cell: i32, d: f32, delta: f32) -> f32 {
    if d > 0.0 {
        (cell as f32 + 1.0 - origin) * delta
    } else if d < 0.0 {
        (origin - cell as f32) * delta
    } else {
        f32::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Solid rock below world height 0, air above.
    struct FlatGenerator {
        delay: Duration,
    }

    impl ChunkGenerator for FlatGenerator {
        fn generate(&self, coord: ChunkCoord) -> ChunkGrid {
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            if coord.z < 0 {
                ChunkGrid::filled(BlockId::ROCK)
            } else {
                ChunkGrid::new()
            }
        }
    }

    fn settings() -> WorldSettings {
        WorldSettings {
            render_distance: 1,
            unload_distance: 2,
            results_per_update: 64,
            worker_count: 2,
            in_flight_budget: 16,
        }
    }

    fn world_with_delay(delay: Duration) -> World<FlatGenerator> {
        World::new(
            settings(),
            Arc::new(BlockRegistry::with_defaults()),
            Arc::new(GeneratingSource::new(FlatGenerator { delay })),
        )
    }

    fn world() -> World<FlatGenerator> {
        world_with_delay(Duration::ZERO)
    }

    const START: [f32; 3] = [0.5, 5.5, -0.5];

    fn pump(world: &mut World<FlatGenerator>, done: impl Fn(&World<FlatGenerator>) -> bool) {
        let start = Instant::now();
        while !done(world) {
            world.update();
            assert!(start.elapsed().as_secs() < 10, "Timed out streaming chunks");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn fully_loaded(world: &World<FlatGenerator>) -> bool {
        world.loaded_count() == world.chunks_in_view() && world.requested_count() == 0
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.world.render_distance = 9;
        config.world.unload_distance = 3;
        config.meshing.worker_count = 5;
        let settings = WorldSettings::from_config(&config);
        assert_eq!(settings.render_distance, 9);
        assert_eq!(settings.unload_distance, 9);
        assert_eq!(settings.worker_count, 5);

        config.meshing.worker_count = 0;
        assert!(WorldSettings::from_config(&config).worker_count >= 1);
    }

    #[test]
    fn test_first_update_requests_ring() {
        let mut world = world_with_delay(Duration::from_millis(20));
        world.move_to(START);
        let report = world.update();
        assert_eq!(report.requested, 7);
        assert_eq!(report.submitted, 7);
        assert_eq!(world.chunks_in_view(), 7);
        assert!(matches!(
            world.chunk_state(ChunkCoord::new(0, 0, 0)),
            Some(ChunkState::Requested { .. })
        ));
        assert!(world.chunk_state(ChunkCoord::new(2, 0, 0)).is_none());
    }

    #[test]
    fn test_streams_ring_to_loaded() {
        let mut world = world();
        world.move_to(START);
        pump(&mut world, fully_loaded);

        let Some(ChunkState::Loaded(ground)) = world.chunk_state(ChunkCoord::new(0, 0, -1)) else {
            panic!("ground chunk not loaded");
        };
        // Rock continues on every side but the top.
        assert_eq!(ground.mesh.quad_count(), 1);
        assert!(ground.bounds.is_some());

        let Some(ChunkState::Loaded(air)) = world.chunk_state(ChunkCoord::new(0, 0, 0)) else {
            panic!("air chunk not loaded");
        };
        assert!(air.mesh.is_empty());
        assert!(air.bounds.is_none());

        let stats = world.stats();
        assert_eq!(stats.loaded, 7);
        assert_eq!(stats.requested, 0);
        assert_eq!(stats.viewer, ChunkCoord::new(0, 0, 0));
        assert!(stats.quads >= 1);
        assert_eq!(stats.vertex_bytes, stats.quads * 6 * 8);
    }

    #[test]
    fn test_render_visits_nearest_first() {
        let mut world = world();
        world.move_to(START);
        pump(&mut world, fully_loaded);

        let mut visited = Vec::new();
        let count = world.render(|chunk| visited.push(chunk.coord));
        assert_eq!(count, 7);
        assert_eq!(visited[0], world.viewer_chunk());
        let center = world.viewer_chunk();
        assert!(
            visited
                .windows(2)
                .all(|w| w[0].distance_sq(center) <= w[1].distance_sq(center))
        );
    }

    #[test]
    fn test_block_at() {
        let mut world = world();
        world.move_to(START);
        pump(&mut world, fully_loaded);

        assert_eq!(world.block_at([0, -1, -1]), BlockId::ROCK);
        assert_eq!(world.block_at([5, -32, -20]), BlockId::ROCK);
        assert_eq!(world.block_at([0, 0, -1]), BlockId::EMPTY);
        // Not loaded.
        assert_eq!(world.block_at([1000, -1, 0]), BlockId::EMPTY);
    }

    #[test]
    fn test_raycast_hits_ground() {
        let mut world = world();
        world.move_to(START);
        pump(&mut world, fully_loaded);

        let hit = world
            .raycast(START, [0.0, -1.0, 0.0], 10.0)
            .expect("ray should hit the ground");
        assert_eq!(hit.block, [0, -1, -1]);
        assert_eq!(hit.id, BlockId::ROCK);
        assert_eq!(hit.normal, [0, 1, 0]);
        assert!((hit.distance - 5.5).abs() < 1e-4);

        assert!(world.raycast(START, [0.0, -1.0, 0.0], 3.0).is_none());
        assert!(world.raycast(START, [1.0, 0.0, 0.0], 20.0).is_none());
        assert!(world.raycast(START, [0.0, 0.0, 0.0], 20.0).is_none());
    }

    #[test]
    fn test_raycast_diagonal() {
        let mut world = world();
        world.move_to(START);
        pump(&mut world, fully_loaded);

        let hit = world
            .raycast([0.5, 2.5, -0.5], [1.0, -1.0, 0.0], 10.0)
            .expect("ray should hit the ground");
        assert_eq!(hit.block[1], -1);
        assert_eq!(hit.normal, [0, 1, 0]);
        assert!(hit.distance > 0.0);
    }

    #[test]
    fn test_moving_away_evicts_and_reloads() {
        let mut world = world();
        world.move_to(START);
        pump(&mut world, fully_loaded);

        world.move_to([4.0 * 32.0 + 0.5, 5.5, -0.5]);
        assert_eq!(world.viewer_chunk(), ChunkCoord::new(4, 0, 0));
        let report = world.update();
        assert_eq!(report.evicted, 7);
        assert!(world.chunk_state(ChunkCoord::new(0, 0, 0)).is_none());

        pump(&mut world, fully_loaded);
        let center = world.viewer_chunk();
        world.render(|chunk| assert!(chunk.coord.distance_sq(center) <= 1));
        assert!(world.source().cached_count() > 0);
        assert!(!world.source().is_cached(ChunkCoord::new(-1, 0, 0)));
    }

    #[test]
    fn test_small_move_keeps_chunks_within_unload_distance() {
        let mut world = world();
        world.move_to(START);
        pump(&mut world, fully_loaded);

        world.move_to([32.5, 5.5, -0.5]);
        let report = world.update();
        // Every old chunk is within two chunks of (1, 0, 0).
        assert_eq!(report.evicted, 0);
        assert_eq!(report.requested, 5);
        assert!(world.chunk_state(ChunkCoord::new(-1, 0, 0)).is_some_and(ChunkState::is_loaded));

        // Leaving the view does not evict; only the unload distance does.
        let mut visited = 0;
        world.render(|_| visited += 1);
        assert!(visited <= 7);
        assert_eq!(world.chunks.len(), 12);
    }

    #[test]
    fn test_results_for_unwanted_chunks_are_dropped() {
        let mut world = world_with_delay(Duration::from_millis(20));
        world.move_to(START);
        world.update();

        let (coord, generation) = world
            .chunks
            .iter()
            .find_map(|(coord, state)| match state {
                ChunkState::Requested { generation } => Some((*coord, *generation)),
                ChunkState::Loaded(_) => None,
            })
            .expect("a chunk should still be requested");

        let result = |coord: ChunkCoord, generation: u64| MeshingResult {
            coord,
            generation,
            chunk: Arc::new(ChunkGrid::new()),
            mesh: MeshData::empty(coord.world_translation()),
            elapsed: Duration::ZERO,
        };

        assert!(!world.integrate(result(ChunkCoord::new(50, 50, 50), 0)));
        assert!(!world.integrate(result(coord, generation + 1000)));
        assert!(world.integrate(result(coord, generation)));
        assert!(!world.integrate(result(coord, generation)));
        assert_eq!(world.stats().dropped_results, 3);
        assert!(world.chunk_state(coord).is_some_and(ChunkState::is_loaded));
    }

    #[test]
    fn test_update_after_shutdown_does_not_block() {
        let mut world = world();
        world.shutdown();
        world.move_to(START);
        let report = world.update();
        assert_eq!(report.requested, 7);
        assert_eq!(report.submitted, 0);
        assert_eq!(world.stats().queued, 7);
    }

    #[test]
    fn test_non_finite_position_ignored() {
        let mut world = world();
        world.move_to([f32::NAN, 0.0, 0.0]);
        assert_eq!(world.viewer_chunk(), ChunkCoord::new(0, 0, 0));
    }
}
