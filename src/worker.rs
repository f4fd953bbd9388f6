//! Background compute worker.
//!
//! A single thread owns the sample grids and runs ingest plus demosaic
//! whenever a request is pending.  Callers only set request flags and read
//! published results, so no call on [`ComputeWorker`] waits for a
//! computation.
//!
//! Requests coalesce: the pending state is one flag plus one load slot, so
//! a burst of requests is served by a single run using the latest
//! configuration.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::ingest::{self, RawSource};
use crate::levels::{check_left_shift, LevelNormalizer};
use crate::raster::FlatImage;
use crate::{DemosaicEngine, DemosaicMode, DemosaicResult, OutputImage, SampleGrid};

/// Sleep between two looks at the request flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(300);

/// Where the next grid comes from.
#[derive(Clone, Debug)]
pub enum LoadRequest {
    /// Bytes already in memory.
    Bytes(Vec<u8>, RawSource),
    /// A file on disk.
    File(PathBuf, RawSource),
    /// A decoded 8-bit image to sample through the colour filter array.
    Image(FlatImage),
}

impl LoadRequest {
    fn ingest(self) -> DemosaicResult<SampleGrid> {
        match self {
            LoadRequest::Bytes(bytes, source) => ingest::decode(&bytes, source),
            LoadRequest::File(path, source) => ingest::read_file(path, source),
            LoadRequest::Image(image) => ingest::from_image(&image),
        }
    }
}

/// Worker start-up configuration.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    pub mode: DemosaicMode,
    pub output_shift: i32,
    pub left_shift: i32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            poll_interval: DEFAULT_POLL_INTERVAL,
            mode: DemosaicMode::Gray,
            output_shift: crate::demosaic::DEFAULT_OUTPUT_SHIFT as i32,
            left_shift: 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Settings {
    engine: DemosaicEngine,
    left_shift: u32,
}

struct Shared {
    start: AtomicBool,
    made: AtomicBool,
    working: AtomicBool,
    done: AtomicBool,
    runs: AtomicU64,
    elapsed_us: AtomicU64,
    pending: Mutex<Option<LoadRequest>>,
    settings: Mutex<Settings>,
    image: Mutex<Arc<OutputImage>>,
    last_error: Mutex<Option<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns one background thread that turns load and compute requests into
/// images.
pub struct ComputeWorker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl ComputeWorker {
    /// Spawn the worker thread.
    ///
    /// Invalid shifts in `config` fall back to the defaults.
    pub fn new(config: WorkerConfig) -> DemosaicResult<Self> {
        let mut engine = DemosaicEngine::new(config.mode);
        if let Err(e) = engine.set_output_shift(config.output_shift) {
            warn!(error = %e, "ignoring configured output shift");
        }
        let left_shift = check_left_shift(config.left_shift).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring configured left shift");
            0
        });

        let shared = Arc::new(Shared {
            start: AtomicBool::new(false),
            made: AtomicBool::new(false),
            working: AtomicBool::new(false),
            done: AtomicBool::new(false),
            runs: AtomicU64::new(0),
            elapsed_us: AtomicU64::new(0),
            pending: Mutex::new(None),
            settings: Mutex::new(Settings { engine, left_shift }),
            image: Mutex::new(Arc::new(OutputImage::default())),
            last_error: Mutex::new(None),
        });

        let poll = config.poll_interval;
        let thread_shared = Arc::clone(&shared);
        info!(poll_interval = ?poll, "starting compute worker");
        let handle = thread::Builder::new()
            .name("rawbayer-worker".into())
            .spawn(move || worker_loop(thread_shared, poll))?;

        Ok(ComputeWorker {
            shared,
            handle: Some(handle),
        })
    }

    /// Queue a new source; replaces any load not yet picked up.
    pub fn request_load(&self, request: LoadRequest) {
        *lock(&self.shared.pending) = Some(request);
        self.request_compute();
    }

    /// Ask for a recompute with the current settings.
    pub fn request_compute(&self) {
        self.shared.start.store(true, Ordering::SeqCst);
    }

    pub fn set_mode(&self, mode: DemosaicMode) {
        lock(&self.shared.settings).engine.set_mode(mode);
        self.request_compute();
    }

    /// Non-positive shifts are ignored.
    pub fn set_output_shift(&self, shift: i32) {
        let res = lock(&self.shared.settings).engine.set_output_shift(shift);
        match res {
            Ok(()) => self.request_compute(),
            Err(e) => warn!(error = %e, "ignoring output shift"),
        }
    }

    /// Negative shifts are ignored.
    pub fn set_left_shift(&self, shift: i32) {
        match check_left_shift(shift) {
            Ok(shift) => {
                lock(&self.shared.settings).left_shift = shift;
                self.request_compute();
            }
            Err(e) => warn!(error = %e, "ignoring left shift"),
        }
    }

    pub fn mode(&self) -> DemosaicMode {
        lock(&self.shared.settings).engine.mode()
    }

    pub fn output_shift(&self) -> u32 {
        lock(&self.shared.settings).engine.output_shift()
    }

    pub fn left_shift(&self) -> u32 {
        lock(&self.shared.settings).left_shift
    }

    /// True once the latest request has been served, successfully or not.
    pub fn is_ready(&self) -> bool {
        self.shared.made.load(Ordering::SeqCst) && !self.shared.start.load(Ordering::SeqCst)
    }

    /// True while a run is in progress.
    pub fn is_working(&self) -> bool {
        self.shared.working.load(Ordering::SeqCst)
    }

    /// The most recent image; stays valid after newer ones are published.
    pub fn image(&self) -> Arc<OutputImage> {
        Arc::clone(&lock(&self.shared.image))
    }

    pub fn width(&self) -> usize {
        lock(&self.shared.image).width()
    }

    pub fn height(&self) -> usize {
        lock(&self.shared.image).height()
    }

    /// Wall-clock time of the most recent ingest and compute.
    pub fn elapsed_time(&self) -> Duration {
        Duration::from_micros(self.shared.elapsed_us.load(Ordering::SeqCst))
    }

    /// Number of finished runs.
    pub fn runs(&self) -> u64 {
        self.shared.runs.load(Ordering::SeqCst)
    }

    /// Error of the most recent run, if it failed.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.shared.last_error).clone()
    }

    /// Stop the loop and wait for the thread.  A run in progress finishes
    /// first.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shared.done.store(true, Ordering::SeqCst);
            handle.thread().unpark();
            if let Err(e) = handle.join() {
                warn!("compute worker panicked: {:?}", e);
            } else {
                debug!("compute worker joined");
            }
        }
    }
}

impl Drop for ComputeWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>, poll: Duration) {
    let mut levels = LevelNormalizer::new();
    debug!("compute worker thread started");

    while !shared.done.load(Ordering::SeqCst) {
        sleep_poll(&shared, poll);
        if shared.done.load(Ordering::SeqCst) {
            break;
        }
        if shared.start.load(Ordering::SeqCst) {
            // Clear `made` first so `is_ready` never sees a stale result.
            shared.made.store(false, Ordering::SeqCst);
            shared.start.store(false, Ordering::SeqCst);
            work(&shared, &mut levels);
        }
    }

    info!("compute worker exiting");
}

/// Park for one poll interval.  Only shutdown cuts it short; spurious
/// wake-ups park again.
fn sleep_poll(shared: &Shared, poll: Duration) {
    let deadline = Instant::now() + poll;
    loop {
        let now = Instant::now();
        if now >= deadline || shared.done.load(Ordering::SeqCst) {
            return;
        }
        thread::park_timeout(deadline - now);
    }
}

fn work(shared: &Shared, levels: &mut LevelNormalizer) {
    shared.working.store(true, Ordering::SeqCst);
    let settings = *lock(&shared.settings);
    let request = lock(&shared.pending).take();
    let started = Instant::now();

    let res = compute(levels, request, &settings);

    let elapsed = started.elapsed();
    shared
        .elapsed_us
        .store(elapsed.as_micros() as u64, Ordering::SeqCst);

    match res {
        Ok(image) => {
            debug!(
                width = image.width(),
                height = image.height(),
                mode = %settings.engine.mode(),
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "compute finished"
            );
            *lock(&shared.image) = Arc::new(image);
            *lock(&shared.last_error) = None;
        }
        Err(e) => {
            warn!(error = %e, "compute failed");
            *lock(&shared.last_error) = Some(e.to_string());
        }
    }

    shared.runs.fetch_add(1, Ordering::SeqCst);
    shared.working.store(false, Ordering::SeqCst);
    shared.made.store(true, Ordering::SeqCst);
}

fn compute(
    levels: &mut LevelNormalizer,
    request: Option<LoadRequest>,
    settings: &Settings,
) -> DemosaicResult<OutputImage> {
    if levels.left_shift() != settings.left_shift {
        levels.set_left_shift(settings.left_shift as i32)?;
    }
    if let Some(request) = request {
        // A failed load keeps the previous grid.
        let grid = request.ingest()?;
        info!(width = grid.cols(), height = grid.rows(), "loaded sample grid");
        levels.load(grid);
    }
    settings.engine.compute(levels.grid())
}
