//! Timer — a device that runs its callback action once, after a delay.
//!
//! ## State machine
//!
//! | From | Trigger | To |
//! |------|---------|----|
//! | `Inactive` | [`Timer::activate`] | `Pending` (a wait task is spawned) |
//! | `Pending` | delay elapses, callback finishes | `Inactive` |
//! | `Pending` | [`Timer::cancel`] before the delay elapses | `Inactive` |
//!
//! Activating a pending timer is rejected with
//! [`TimerError::AlreadyActive`]. Cancelling an inactive timer is a no-op.
//!
//! Once the delay has elapsed the wait task claims the slot before running
//! the callback, so a concurrent `cancel` either wins (the callback never
//! runs) or loses and reports `false` (the callback runs to completion).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use blox_domain::device::{Device, DeviceSnapshot};
use blox_domain::error::{BloxError, TimerError};
use blox_domain::event::{Event, EventKind};
use blox_domain::timer::{TimerSpec, TimerState};

use crate::action_executor::ActionExecutor;
use crate::ports::{EventPublisher, Interpreter};

/// What a timer needs to fire: an executor for its callback and a place to
/// announce state changes.
pub struct TimerContext<I, P> {
    executor: ActionExecutor<I>,
    events: Arc<P>,
}

impl<I, P> Clone for TimerContext<I, P> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            events: Arc::clone(&self.events),
        }
    }
}

impl<I, P> TimerContext<I, P> {
    pub fn new(executor: ActionExecutor<I>, events: Arc<P>) -> Self {
        Self { executor, events }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Firing,
}

struct PendingWait {
    generation: u64,
    phase: Phase,
    handle: JoinHandle<()>,
}

type Slot = Arc<Mutex<Option<PendingWait>>>;

/// A device that schedules a one-shot delayed execution of an action.
pub struct Timer {
    device: Device,
    spec: Arc<TimerSpec>,
    pending: Slot,
    generation: AtomicU64,
}

impl Timer {
    /// Create an inactive timer.
    #[must_use]
    pub fn new(device: Device, spec: TimerSpec) -> Self {
        Self {
            device,
            spec: Arc::new(spec),
            pending: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[must_use]
    pub fn spec(&self) -> &TimerSpec {
        &self.spec
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        if lock(&self.pending).is_some() {
            TimerState::Pending
        } else {
            TimerState::Inactive
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == TimerState::Pending
    }

    /// Wire representation, including the `active` flag.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            timer: Some(self.spec.fields(self.state())),
            ..self.device.snapshot()
        }
    }

    /// Start waiting; the callback runs once the timeout elapses.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::AlreadyActive`] when a wait is already pending
    /// (including while the callback is running). The pending wait is left
    /// untouched.
    pub async fn activate<I, P>(&self, ctx: &TimerContext<I, P>) -> Result<(), BloxError>
    where
        I: Interpreter + Send + Sync + 'static,
        P: EventPublisher + Send + Sync + 'static,
    {
        {
            let mut slot = lock(&self.pending);
            if slot.is_some() {
                return Err(TimerError::AlreadyActive {
                    name: self.device.name.clone(),
                }
                .into());
            }
            let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
            let handle = tokio::spawn(wait_and_fire(
                generation,
                self.device.name.clone(),
                Arc::clone(&self.spec),
                Arc::clone(&self.pending),
                ctx.clone(),
            ));
            *slot = Some(PendingWait {
                generation,
                phase: Phase::Waiting,
                handle,
            });
        }

        tracing::info!(
            device = %self.device.name,
            timeout = %self.spec.timeout,
            "timer activated"
        );
        ctx.events
            .publish(Event::new(EventKind::TimerActivated, self.device.name.clone()))
            .await
    }

    /// Cancel the pending wait.
    ///
    /// Returns `true` when a wait was cancelled before its callback started.
    /// Returns `false` when the timer is inactive or its callback is already
    /// running; in the latter case the callback completes normally.
    pub fn cancel(&self) -> bool {
        let mut slot = lock(&self.pending);
        if !slot.as_ref().is_some_and(|wait| wait.phase == Phase::Waiting) {
            return false;
        }
        if let Some(wait) = slot.take() {
            wait.handle.abort();
        }
        tracing::info!(device = %self.device.name, "timer cancelled");
        true
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("device", &self.device)
            .field("spec", &self.spec)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn wait_and_fire<I, P>(
    generation: u64,
    device: String,
    spec: Arc<TimerSpec>,
    pending: Slot,
    ctx: TimerContext<I, P>,
) where
    I: Interpreter + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    tokio::time::sleep(spec.timeout()).await;

    {
        let mut slot = lock(&pending);
        match slot.as_mut() {
            Some(wait) if wait.generation == generation && wait.phase == Phase::Waiting => {
                wait.phase = Phase::Firing;
            }
            _ => return,
        }
    }
    let firing = FiringGuard {
        generation,
        pending: Arc::clone(&pending),
    };

    tracing::debug!(device = %device, action = %spec.callback.name(), "timer elapsed");
    match ctx.executor.execute(&spec.callback, "").await {
        Ok(()) => tracing::info!(device = %device, "timer callback finished"),
        Err(BloxError::Execution(err)) => tracing::warn!(
            device = %device,
            action = %err.name,
            exit_code = ?err.exit_code,
            stdout = %err.stdout,
            stderr = %err.stderr,
            "timer callback failed"
        ),
        Err(err) => tracing::warn!(device = %device, error = %err, "timer callback could not run"),
    }

    drop(firing);

    if let Err(err) = ctx
        .events
        .publish(Event::new(EventKind::TimerElapsed, device.clone()))
        .await
    {
        tracing::warn!(device = %device, error = %err, "failed to publish timer event");
    }
}

/// Clears this generation's slot once the callback section is left, whether
/// the callback returned or panicked.
struct FiringGuard {
    generation: u64,
    pending: Slot,
}

impl Drop for FiringGuard {
    fn drop(&mut self) {
        let mut slot = lock(&self.pending);
        if slot.as_ref().is_some_and(|wait| wait.generation == self.generation) {
            *slot = None;
        }
    }
}

fn lock(slot: &Mutex<Option<PendingWait>>) -> MutexGuard<'_, Option<PendingWait>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
