//! Asynchronous meshing pipeline: loads and meshes chunks on a thread pool
//! and hands the results back through a channel.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tessel_voxel::{BlockRegistry, ChunkCoord, ChunkGrid, ChunkSource, NeighborCache};

use crate::mesher::ChunkMesher;
use crate::packed::MeshData;

/// A request to load and mesh one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshingTask {
    pub coord: ChunkCoord,
    /// Request generation, echoed back so stale results can be told apart.
    pub generation: u64,
}

/// A loaded and meshed chunk.
pub struct MeshingResult {
    pub coord: ChunkCoord,
    pub generation: u64,
    /// Block data of the chunk itself.
    pub chunk: Arc<ChunkGrid>,
    pub mesh: MeshData,
    /// Time spent loading neighbors and meshing.
    pub elapsed: Duration,
}

/// Worker pool that turns chunk coordinates into meshes.
///
/// The caller submits [`MeshingTask`]s with [`submit`](Self::submit) and
/// collects [`MeshingResult`]s with [`drain_results`](Self::drain_results);
/// neither call blocks. Each worker owns one [`ChunkMesher`], so scratch
/// buffers are never shared. Neighbors come from the shared [`ChunkSource`].
pub struct MeshingPipeline {
    task_sender: Option<crossbeam_channel::Sender<MeshingTask>>,
    result_receiver: crossbeam_channel::Receiver<MeshingResult>,
    worker_handles: Vec<JoinHandle<()>>,
    /// Maximum number of tasks queued or running at once.
    budget: usize,
    in_flight: Arc<AtomicUsize>,
}

impl MeshingPipeline {
    /// Spawns `worker_count` meshing threads.
    ///
    /// `budget` caps the number of in-flight tasks; submissions beyond it are
    /// refused until results are drained.
    pub fn new(
        worker_count: usize,
        budget: usize,
        registry: Arc<BlockRegistry>,
        source: Arc<dyn ChunkSource>,
    ) -> Self {
        let budget = budget.max(1);
        let (task_tx, task_rx) = crossbeam_channel::bounded::<MeshingTask>(budget);
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count.max(1) {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            let source = Arc::clone(&source);
            let flight = Arc::clone(&in_flight);
            let mut mesher = ChunkMesher::new(Arc::clone(&registry));

            let spawned = std::thread::Builder::new()
                .name(format!("mesh-worker-{index}"))
                .spawn(move || {
                    while let Ok(task) = rx.recv() {
                        // Released after the result is sent, or during unwinding.
                        let _slot = InFlightSlot(&flight);
                        let job = panic::catch_unwind(AssertUnwindSafe(|| {
                            run_task(&mut mesher, &*source, task)
                        }));
                        match job {
                            Ok(result) => {
                                let _ = tx.send(result);
                            }
                            Err(_) => tracing::error!(
                                coord = %task.coord,
                                generation = task.generation,
                                "meshing panicked, chunk dropped"
                            ),
                        }
                    }
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => tracing::error!("failed to spawn mesh worker {index}: {err}"),
            }
        }

        tracing::info!(workers = handles.len(), budget, "meshing pipeline started");

        Self {
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            worker_handles: handles,
            budget,
            in_flight,
        }
    }

    /// Queues a task. Returns `false` if the budget is exhausted or the
    /// pipeline has been shut down.
    pub fn submit(&self, task: MeshingTask) -> bool {
        let Some(sender) = &self.task_sender else {
            return false;
        };
        if self.worker_handles.is_empty() || self.in_flight.load(Ordering::Relaxed) >= self.budget {
            return false;
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.try_send(task).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Collects every finished result without blocking.
    pub fn drain_results(&self) -> Vec<MeshingResult> {
        self.result_receiver.try_iter().collect()
    }

    /// Collects at most `max` finished results without blocking.
    pub fn drain_up_to(&self, max: usize) -> Vec<MeshingResult> {
        self.result_receiver.try_iter().take(max).collect()
    }

    /// Tasks queued or being processed.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Whether another task would currently be accepted.
    pub fn has_capacity(&self) -> bool {
        self.task_sender.is_some() && self.in_flight_count() < self.budget
    }

    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    /// Stops accepting tasks, lets workers finish what is queued and joins them.
    pub fn shutdown(&mut self) {
        if self.task_sender.take().is_none() {
            return;
        }
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
        tracing::info!("meshing pipeline stopped");
    }
}

/// Holds one unit of the in-flight budget until dropped.
struct InFlightSlot<'a>(&'a AtomicUsize);

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

fn run_task(mesher: &mut ChunkMesher, source: &dyn ChunkSource, task: MeshingTask) -> MeshingResult {
    let start = Instant::now();
    let chunk = source.load_chunk(task.coord);
    let cache = NeighborCache::with_center(source, task.coord, Arc::clone(&chunk));
    let mesh = mesher.mesh(task.coord, &cache);
    let elapsed = start.elapsed();
    tracing::debug!(
        coord = %task.coord,
        quads = mesh.quad_count(),
        neighbors = cache.loaded_slots(),
        elapsed_us = elapsed.as_micros() as u64,
        "chunk meshed"
    );

    MeshingResult {
        coord: task.coord,
        generation: task.generation,
        chunk,
        mesh,
        elapsed,
    }
}

impl Drop for MeshingPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
