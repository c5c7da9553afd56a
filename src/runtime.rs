//! Process-wide startup state.
//!
//! [`startup`] validates and installs a [`StartupConfig`], forces the
//! supported-type registry, and logs the effective settings. Operations do
//! not require it: before startup (and after [`shutdown`]) they run with the
//! default config.

use crate::config::{ConfigError, StartupConfig, effective_threads};
use crate::imaging::{RustBackend, supported_types};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

struct RuntimeState {
    running: bool,
    config: Arc<StartupConfig>,
}

static RUNTIME: LazyLock<Mutex<RuntimeState>> = LazyLock::new(|| {
    Mutex::new(RuntimeState {
        running: false,
        config: Arc::new(StartupConfig::default()),
    })
});

static LIVE_HANDLES: HandleCounter = HandleCounter::new();

fn state() -> MutexGuard<'static, RuntimeState> {
    // The state stays consistent even if a holder panicked
    RUNTIME.lock().unwrap_or_else(|e| e.into_inner())
}

/// Counts handles given out to a host and not yet released.
#[derive(Debug, Default)]
pub struct HandleCounter(AtomicUsize);

impl HandleCounter {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub fn acquire(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement, saturating at zero.
    pub fn release(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Start the runtime. Passing `None` uses the default config.
///
/// A second call while running logs a warning and keeps the first config.
pub fn startup(config: Option<StartupConfig>) -> Result<(), ConfigError> {
    let mut state = state();
    if state.running {
        log::warn!("pixbridge already started");
        return Ok(());
    }

    let config = config.unwrap_or_default();
    config.validate()?;

    for image_type in supported_types() {
        log::info!("Registered image type loader type={image_type}");
    }

    log::info!(
        "pixbridge started with concurrency={} report_leaks={} max_width={:?} max_height={:?} quality={} compression={}",
        effective_threads(&config),
        config.report_leaks,
        config.limits.max_width,
        config.limits.max_height,
        config.export.quality,
        config.export.compression,
    );

    state.config = Arc::new(config);
    state.running = true;
    Ok(())
}

/// Stop the runtime, reporting leaked handles when configured to.
pub fn shutdown() {
    let mut state = state();
    if !state.running {
        return;
    }
    if let Some(warning) = leak_warning(state.config.report_leaks, LIVE_HANDLES.count()) {
        log::warn!("{warning}");
    }
    state.running = false;
    state.config = Arc::new(StartupConfig::default());
}

fn leak_warning(report_leaks: bool, live: usize) -> Option<String> {
    (report_leaks && live > 0)
        .then(|| format!("pixbridge shutting down with {live} image handle(s) still alive"))
}

pub fn is_running() -> bool {
    state().running
}

/// The active config (defaults when not started).
pub fn config() -> Arc<StartupConfig> {
    Arc::clone(&state().config)
}

/// A backend honouring the active decoder limits.
pub fn backend() -> RustBackend {
    RustBackend::with_limits(config().limits.to_limits())
}

/// Image handles given to the host and not yet released.
pub fn live_handles() -> &'static HandleCounter {
    &LIVE_HANDLES
}
