//! Cancellable periodic sampling task.
//!
//! The task sleeps for the current [`SamplingPeriod`], runs one cycle, and repeats while the
//! cycle asks to be rescheduled. Cancelling wakes the sleeper and joins the thread, so any
//! in-flight cycle completes before [`SamplerTask::cancel`] returns.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::log::{debug, error};

/// Lowest accepted sampling period, in milliseconds.
pub const MIN_PERIOD_MS: u32 = 9;
/// Sampling period used until the control surface changes it.
pub const DEFAULT_PERIOD_MS: u32 = 50;

/// Interval between sampler cycles.
///
/// Read by the sampler at every reschedule without the device lock, so a change takes effect
/// at the next sleep.
#[derive(Debug)]
pub struct SamplingPeriod {
    millis: AtomicU32,
}

impl SamplingPeriod {
    /// Creates a period of `millis` milliseconds, clamped to the floor.
    pub fn from_millis(millis: u32) -> Self {
        Self {
            millis: AtomicU32::new(millis.max(MIN_PERIOD_MS)),
        }
    }

    /// Applies a requested delay and returns the effective period.
    ///
    /// One millisecond is taken off the request to absorb timer granularity before the
    /// [`MIN_PERIOD_MS`] floor is applied.
    pub fn set_delay_ms(&self, requested_ms: u32) -> Duration {
        let millis = requested_ms.saturating_sub(1).max(MIN_PERIOD_MS);
        self.millis.store(millis, Ordering::Relaxed);
        Duration::from_millis(u64::from(millis))
    }

    /// Current period.
    pub fn get(&self) -> Duration {
        Duration::from_millis(u64::from(self.millis()))
    }

    /// Current period in milliseconds.
    pub fn millis(&self) -> u32 {
        self.millis.load(Ordering::Relaxed)
    }
}

impl Default for SamplingPeriod {
    fn default() -> Self {
        Self::from_millis(DEFAULT_PERIOD_MS)
    }
}

/// Work driven by a [`SamplerTask`].
pub trait Periodic: Send + Sync + 'static {
    /// Delay before the next cycle.
    fn period(&self) -> Duration;

    /// Runs one cycle; returns `false` to stop rescheduling.
    fn run_cycle(&self) -> bool;
}

#[derive(Debug, Default)]
struct CancelSignal {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelSignal {
    /// Sleeps for `period` unless cancelled; returns `true` on cancellation.
    fn sleep(&self, period: Duration) -> bool {
        let cancelled = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        let (cancelled, _) = self
            .wake
            .wait_timeout_while(cancelled, period, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled
    }

    fn cancel(&self) {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wake.notify_all();
    }
}

/// Handle to a running sampler thread.
#[derive(Debug)]
pub struct SamplerTask {
    signal: Arc<CancelSignal>,
    handle: JoinHandle<()>,
}

impl SamplerTask {
    /// Starts the periodic task; the first cycle runs one period from now.
    pub fn spawn<P: Periodic>(work: Arc<P>) -> io::Result<Self> {
        let signal = Arc::new(CancelSignal::default());
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name("lis3df-sampler".into())
            .spawn(move || {
                debug!("sampler started");
                loop {
                    if thread_signal.sleep(work.period()) {
                        debug!("sampler cancelled");
                        break;
                    }
                    if !work.run_cycle() {
                        debug!("sampler stopped rescheduling");
                        break;
                    }
                }
            })?;

        Ok(Self { signal, handle })
    }

    /// Whether the thread is still scheduled or mid-cycle.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops rescheduling and waits for an in-flight cycle to finish.
    pub fn cancel(self) {
        self.signal.cancel();
        if self.handle.join().is_err() {
            error!("sampler thread panicked");
        }
    }
}

/// Owner of at most one [`SamplerTask`].
///
/// Holding the slot lock serializes state transitions that start or stop sampling. Dropping
/// the slot cancels and drains the task.
#[derive(Debug, Default)]
pub struct TaskSlot {
    task: Mutex<Option<SamplerTask>>,
}

impl TaskSlot {
    /// Locks the slot for a start/stop transition.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, Option<SamplerTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        let task = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.cancel();
        }
    }
}
