use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU32, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::{Notify, Semaphore},
    task::{JoinError, JoinHandle},
};
use tracing::debug;

use super::{
    level::{Level, ParseObserver},
    logger::{LogLevel, LogQueue, LoggerEntry},
};
use crate::error::{ErrorLayer, Result, ToolError};

/// Identifies a level scheduled on a `Container`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelHandle(usize);

/// Parses one level on the blocking pool.  Failures are reported to the
/// observer and yield `None`.
pub(crate) type LevelLoader = fn(&Path, &mut dyn ParseObserver) -> Option<Level>;

/// Levels held in memory at once when nothing else was configured.
fn default_concurrent_loads() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

/// State shared between the container and its loader jobs.
struct LoadState {
    /// Per-level progress in [0, 1], stored as `f32` bits.
    progress: Vec<AtomicU32>,
    finished: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
    log: LogQueue,
    /// Signalled whenever a job makes progress, logs, or finishes.
    activity: Notify,
}

impl LoadState {
    fn bump_progress(&self, slot: usize, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        let cell = &self.progress[slot];
        // Only the owning job writes its slot, so load-then-store is fine.
        if fraction > f32::from_bits(cell.load(Ordering::Acquire)) {
            cell.store(fraction.to_bits(), Ordering::Release);
        }
        self.activity.notify_one();
    }
}

struct JobObserver {
    state: Arc<LoadState>,
    slot: usize,
}

impl ParseObserver for JobObserver {
    fn progress(&mut self, fraction: f32) {
        self.state.bump_progress(self.slot, fraction);
    }

    fn log(&mut self, entry: LoggerEntry) {
        self.state.log.push(entry);
        self.state.activity.notify_one();
    }
}

/// Marks a job finished even if parsing panics, so `is_done` can't hang.
struct FinishGuard {
    state: Arc<LoadState>,
    slot: usize,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.state.bump_progress(self.slot, 1.0);
        self.state.finished.fetch_add(1, Ordering::AcqRel);
        self.state.activity.notify_one();
    }
}

/// Counts a level as in flight while it is alive.
struct ActiveLoad(Arc<LoadState>);

impl ActiveLoad {
    fn enter(state: Arc<LoadState>) -> Self {
        let now = state.active.fetch_add(1, Ordering::AcqRel) + 1;
        state.peak_active.fetch_max(now, Ordering::AcqRel);
        ActiveLoad(state)
    }
}

impl Drop for ActiveLoad {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Loads a batch of level files in the background.
///
/// Usage mirrors a classic asset container: schedule every file with
/// `add_level`, kick everything off once with `start_loading`, then poll
/// `is_done` while draining `next_log` and displaying `overall_progress`.
/// Once done, `finish` joins the jobs and makes the parsed levels available.
///
/// Must be driven from within a tokio runtime; parsing runs on the blocking
/// pool.  Every job holds its whole file in memory, so at most
/// `max_concurrent_loads` of them run at a time.
pub struct Container {
    scheduled: Vec<PathBuf>,
    max_concurrent_loads: usize,
    state: Option<Arc<LoadState>>,
    jobs: Vec<JoinHandle<std::result::Result<Option<Level>, JoinError>>>,
    levels: Vec<Option<Level>>,
}

impl Default for Container {
    fn default() -> Self {
        Container {
            scheduled: vec![],
            max_concurrent_loads: default_concurrent_loads(),
            state: None,
            jobs: vec![],
            levels: vec![],
        }
    }
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of levels parsed (and held in memory) at once.
    /// Defaults to the available parallelism; values below 1 mean 1.
    pub fn with_max_concurrent_loads(mut self, max: usize) -> Self {
        self.max_concurrent_loads = max.max(1);
        self
    }

    pub fn add_level<P: AsRef<Path>>(&mut self, path: P) -> Result<LevelHandle> {
        if self.state.is_some() {
            return Err(ToolError::sticky(
                ErrorLayer::BadInput,
                format!(
                    "Cannot schedule {} after loading started",
                    path.as_ref().display()
                ),
            ));
        }
        self.scheduled.push(path.as_ref().to_path_buf());
        Ok(LevelHandle(self.scheduled.len() - 1))
    }

    /// Spawn one job per scheduled level.  Calling this twice is a no-op.
    pub fn start_loading(&mut self) -> Result<()> {
        self.start_loading_with(load_one)
    }

    pub(crate) fn start_loading_with(&mut self, loader: LevelLoader) -> Result<()> {
        if self.state.is_some() {
            return Ok(());
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ToolError::sticky(
                ErrorLayer::ServerLayer,
                format!("Level loading needs a tokio runtime: {}", e),
            )
        })?;

        let state = Arc::new(LoadState {
            progress: self.scheduled.iter().map(|_| AtomicU32::new(0)).collect(),
            finished: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
            log: LogQueue::default(),
            activity: Notify::new(),
        });
        let limit = Arc::new(Semaphore::new(self.max_concurrent_loads));

        for (slot, path) in self.scheduled.iter().enumerate() {
            let path = path.clone();
            let state = state.clone();
            let limit = limit.clone();
            self.jobs.push(runtime.spawn(async move {
                // The semaphore is never closed; the permit is held until the
                // blocking job has dropped the file contents.
                let _permit = limit.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || {
                    let _guard = FinishGuard {
                        state: state.clone(),
                        slot,
                    };
                    let _active = ActiveLoad::enter(state.clone());
                    let mut observer = JobObserver { state, slot };
                    loader(&path, &mut observer)
                })
                .await
            }));
        }

        debug!(
            "started loading {} levels, at most {} at a time",
            self.scheduled.len(),
            self.max_concurrent_loads
        );
        self.state = Some(state);
        Ok(())
    }

    /// True once every scheduled level has finished loading, successfully or
    /// not.  A container with nothing scheduled is trivially done.
    pub fn is_done(&self) -> bool {
        match &self.state {
            Some(state) => state.finished.load(Ordering::Acquire) >= self.scheduled.len(),
            None => self.scheduled.is_empty(),
        }
    }

    /// Mean progress over all scheduled levels, in [0, 1].  Never decreases.
    pub fn overall_progress(&self) -> f32 {
        let state = match &self.state {
            Some(state) => state,
            None if self.scheduled.is_empty() => return 1.0,
            None => return 0.0,
        };
        if state.progress.is_empty() {
            return 1.0;
        }
        let sum: f32 = state
            .progress
            .iter()
            .map(|cell| f32::from_bits(cell.load(Ordering::Acquire)))
            .sum();
        (sum / state.progress.len() as f32).clamp(0.0, 1.0)
    }

    /// Most levels that were being parsed at the same time so far.
    pub fn peak_concurrent_loads(&self) -> usize {
        self.state
            .as_ref()
            .map_or(0, |state| state.peak_active.load(Ordering::Acquire))
    }

    /// Pop the oldest pending diagnostic, if any.
    pub fn next_log(&self) -> Option<LoggerEntry> {
        self.state.as_ref().and_then(|state| state.log.pop())
    }

    /// Wait until some job reports activity or `timeout` elapses, whichever
    /// comes first.
    pub async fn wait_for_activity(&self, timeout: Duration) {
        match &self.state {
            Some(state) => {
                let _ = tokio::time::timeout(timeout, state.activity.notified()).await;
            }
            None => tokio::task::yield_now().await,
        }
    }

    /// Join all loader jobs and keep their results.  Levels that failed to
    /// parse have already logged why and are simply absent.  A job that
    /// panicked is reported as an error after all other jobs were joined; the
    /// levels of the other jobs stay available either way.
    pub async fn finish(&mut self) -> Result<()> {
        let mut first_err = None;
        for (slot, job) in self.jobs.drain(..).enumerate() {
            match job.await {
                Ok(Ok(level)) => self.levels.push(level),
                Ok(Err(err)) | Err(err) => {
                    self.levels.push(None);
                    if first_err.is_none() {
                        first_err = Some(ToolError::sticky(
                            ErrorLayer::ServerLayer,
                            format!(
                                "Loader job for {} failed: {}",
                                self.scheduled[slot].display(),
                                err
                            ),
                        ));
                    }
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn get_level(&self, handle: LevelHandle) -> Option<&Level> {
        self.levels.get(handle.0)?.as_ref()
    }

    /// All successfully loaded levels, in scheduling order.
    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter().flatten()
    }
}

fn load_one(path: &Path, observer: &mut dyn ParseObserver) -> Option<Level> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match Level::load(path, observer) {
        Ok(level) => {
            observer.log(LoggerEntry::new(
                LogLevel::Info,
                file,
                format!("Loaded {} entity classes", level.classes.len()),
            ));
            Some(level)
        }
        Err(err) => {
            observer.log(LoggerEntry::new(LogLevel::Error, file, err.to_string()));
            None
        }
    }
}

/// Loader that blows up on files named `panic.lvl` and loads everything else
/// normally.
#[cfg(test)]
pub(crate) fn panicking_loader(path: &Path, observer: &mut dyn ParseObserver) -> Option<Level> {
    if path.file_name().map_or(false, |n| n == "panic.lvl") {
        panic!("loader blew up on {}", path.display());
    }
    load_one(path, observer)
}
