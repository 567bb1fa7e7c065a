// ============================================================================
// reelmix-core/src/context.rs
// ============================================================================
//
// RUN CONTEXT: Cooperative Pause and Cancellation
//
// The run context is the only cross-component shared state of a batch. It is
// passed explicitly through every pipeline call and carries two signals:
//
// - a cancellation flag, set once and never cleared
// - a pause gate, open while runnable and closed while suspended
//
// Workers observe both at their suspension points through `checkpoint()`.
// The UI side holds a `RunControl` handle obtained from `control()`.
//
// `ResumeLatch` is the separate, longer wait used for manual review: the
// pipeline blocks on it after producing segments until the user says go.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info};

use crate::error::{CoreError, CoreResult};

/// Upper bound on a single condvar wait so a cancel is never missed.
const WAIT_SLICE: Duration = Duration::from_millis(100);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    cancelled: AtomicBool,
    paused: Mutex<bool>,
    gate: Condvar,
}

/// Run-scoped pause and cancellation signals.
///
/// Cloning is cheap; all clones observe the same signals.
#[derive(Clone)]
pub struct RunContext {
    shared: Arc<Shared>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("cancelled", &self.is_cancelled())
            .field("paused", &*lock(&self.shared.paused))
            .finish()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                paused: Mutex::new(false),
                gate: Condvar::new(),
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Blocks while the pause gate is closed.
    ///
    /// Returns `Err(Cancelled)` as soon as cancellation is observed, whether
    /// the gate was open or not.
    pub fn wait_until_runnable(&self) -> CoreResult<()> {
        let mut paused = lock(&self.shared.paused);
        while *paused {
            if self.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            paused = self
                .shared
                .gate
                .wait_timeout(paused, WAIT_SLICE)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        drop(paused);

        if self.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        Ok(())
    }

    /// Suspension point: waits out a pause, then fails if cancelled.
    pub fn checkpoint(&self) -> CoreResult<()> {
        self.wait_until_runnable()
    }

    /// Handle for the controlling side (UI, stdin reader, tests).
    pub fn control(&self) -> RunControl {
        RunControl {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Pause, resume and cancel handle shared with whoever drives the run.
#[derive(Clone)]
pub struct RunControl {
    shared: Arc<Shared>,
}

impl RunControl {
    pub fn pause(&self) {
        *lock(&self.shared.paused) = true;
        info!("Paused");
    }

    pub fn resume(&self) {
        *lock(&self.shared.paused) = false;
        self.shared.gate.notify_all();
        info!("Resumed");
    }

    /// Requests cancellation. Any paused worker wakes up and fails.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        // Take the lock so a waiter between its flag check and its wait still wakes
        let _guard = lock(&self.shared.paused);
        self.shared.gate.notify_all();
        info!("Cancellation requested");
    }

    pub fn is_paused(&self) -> bool {
        *lock(&self.shared.paused)
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }
}

// ============================================================================
// RESUME LATCH
// ============================================================================

#[derive(Default)]
struct LatchState {
    released: bool,
    closed: bool,
}

/// One-shot signal used for the manual review wait.
///
/// `arm` resets it before each review, `release` lets the current waiter
/// continue and `close` makes every later wait return immediately (the
/// controlling input went away).
#[derive(Clone, Default)]
pub struct ResumeLatch {
    inner: Arc<(Mutex<LatchState>, Condvar)>,
}

impl ResumeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) {
        lock(&self.inner.0).released = false;
    }

    pub fn release(&self) {
        lock(&self.inner.0).released = true;
        self.inner.1.notify_all();
    }

    pub fn close(&self) {
        lock(&self.inner.0).closed = true;
        self.inner.1.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner.0).closed
    }

    /// Blocks until released or closed. Fails with `Cancelled` if the run is
    /// cancelled while waiting.
    pub fn wait(&self, ctx: &RunContext) -> CoreResult<()> {
        let (state, signal) = &*self.inner;
        let mut guard = lock(state);
        loop {
            if ctx.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            if guard.released || guard.closed {
                debug!("Review latch opened");
                return Ok(());
            }
            guard = signal
                .wait_timeout(guard, WAIT_SLICE)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}
