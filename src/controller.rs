//! Background control loop: lifecycle, cancellation and status publishing.
//!
//! Each [`ThermalController`] owns at most one loop thread.  The thread
//! runs an `edge-executor` driven by `futures-lite::block_on`; the
//! interval wait is an `async-io-mini` reactor timer raced against an
//! `embassy-sync` [`Signal`] that acts as the cancellation token.
//!
//! ```text
//!  ┌────────────────────────────────────────────────────────────┐
//!  │  caller                         thermal-loop thread        │
//!  │  ───────                        ───────────────────        │
//!  │  start() ──── spawn(parts) ───▶ loop {                     │
//!  │                                   tick()                   │
//!  │  status() ◀── STATUS mutex ─────  publish snapshot         │
//!  │                                   or(timer, cancel).await  │
//!  │  stop() ───── cancel.signal() ─▶ }                         │
//!  │         ◀──── exited.signal() ── return parts              │
//!  └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service, its sensors and fans and the event sink move onto the
//! loop thread on `start()` and come back when the thread is joined, so
//! the mutable control state is only ever touched by one thread.  The
//! caller sees a copy of the last published snapshot.
//!
//! State machine: `Stopped → Running` on `start()`; `Running → Stopped`
//! on `stop()` or emergency shutdown.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{error, info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::app::events::{StatusSnapshot, StopReason, ThermalEvent};
use crate::app::ports::{EventSink, TemperatureSource};
use crate::app::service::{ThermalService, TickOutcome};
use crate::config::ThermalConfig;
use crate::error::{LifecycleError, Result};

const LOOP_THREAD_NAME: &str = "thermal-loop";

// ── Shared state ─────────────────────────────────────────────

/// State shared between the caller and the loop thread.
struct Shared {
    running: AtomicBool,
    /// Set by the loop thread just before it returns.
    done: AtomicBool,
    /// Cancellation token: `stop()` → loop.
    cancel: Signal<CriticalSectionRawMutex, ()>,
    /// Exit notification: loop → `stop()` / `wait_stopped()`.
    exited: Signal<CriticalSectionRawMutex, StopReason>,
    /// Last published snapshot.
    status: Mutex<CriticalSectionRawMutex, RefCell<StatusSnapshot>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            done: AtomicBool::new(false),
            cancel: Signal::new(),
            exited: Signal::new(),
            status: Mutex::new(RefCell::new(StatusSnapshot::default())),
        }
    }

    fn publish(&self, snapshot: StatusSnapshot) {
        self.status.lock(|s| *s.borrow_mut() = snapshot);
    }

    fn snapshot(&self) -> StatusSnapshot {
        self.status.lock(|s| s.borrow().clone())
    }

    /// Last step of the loop thread.  `done` is set before `running` is
    /// cleared, so a caller that sees the loop stopped can always join it.
    fn finish(&self, reason: StopReason) {
        self.done.store(true, Ordering::Release);
        self.running.store(false, Ordering::Release);
        self.exited.signal(reason);
    }
}

/// Everything the loop thread owns while running.
struct LoopParts {
    service: ThermalService,
    sink: Box<dyn EventSink>,
}

/// Slot the parts travel through to the loop thread.  If the spawn fails
/// they are still here and go back to the controller.
type Handoff = Mutex<CriticalSectionRawMutex, RefCell<Option<LoopParts>>>;

// ── Controller ───────────────────────────────────────────────

/// Handle to one thermal control loop.
pub struct ThermalController {
    /// `Some` while stopped and reclaimed.
    parts: Option<LoopParts>,
    /// `Some` from `start()` until the thread is joined.
    worker: Option<JoinHandle<Option<LoopParts>>>,
    shared: Arc<Shared>,
    interval: Duration,
    stop_timeout: Duration,
    /// Loop thread stack; `None` uses the std default.
    stack_size: Option<usize>,
}

impl ThermalController {
    /// Controller that reports events through [`LogEventSink`].
    pub fn new(config: ThermalConfig) -> Result<Self> {
        Self::with_sink(config, Box::new(LogEventSink::new()))
    }

    pub fn with_sink(config: ThermalConfig, sink: Box<dyn EventSink>) -> Result<Self> {
        let interval = config.control_interval();
        let stop_timeout = config.stop_timeout();
        let service = ThermalService::new(config)?;
        Ok(Self {
            parts: Some(LoopParts { service, sink }),
            worker: None,
            shared: Arc::new(Shared::new()),
            interval,
            stop_timeout,
            stack_size: None,
        })
    }

    // ── Registration (Stopped only) ───────────────────────────

    pub fn add_sensor(
        &mut self,
        id: &str,
        location: &str,
        source: Box<dyn TemperatureSource>,
    ) -> Result<()> {
        self.service_mut()?.add_sensor(id, location, source)
    }

    pub fn add_simulated_sensor(&mut self, id: &str, location: &str) -> Result<()> {
        self.service_mut()?.add_simulated_sensor(id, location)
    }

    pub fn add_fan(&mut self, id: &str) -> Result<()> {
        self.service_mut()?.add_fan(id)
    }

    /// Command one fan directly.  Only the loop mutates fans while it runs,
    /// so this is rejected with [`LifecycleError::Running`] until it stops.
    pub fn set_fan_speed(&mut self, fan_id: &str, speed: f32) -> Result<()> {
        self.service_mut()?.set_fan_speed(fan_id, speed)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Spawn the loop thread.
    ///
    /// Returns `Ok(false)` without spawning anything when the loop is
    /// already running.
    pub fn start(&mut self) -> Result<bool> {
        if self.is_running() {
            warn!("Thermal management system already running");
            return Ok(false);
        }
        self.reclaim()?;
        let parts = self.parts.take().ok_or(LifecycleError::WorkerLost)?;

        self.shared.cancel.reset();
        self.shared.exited.reset();
        self.shared.done.store(false, Ordering::Release);
        self.shared.publish(parts.service.status(true));
        self.shared.running.store(true, Ordering::Release);

        let handoff: Arc<Handoff> = Arc::new(Mutex::new(RefCell::new(Some(parts))));
        let thread_handoff = Arc::clone(&handoff);
        let shared = Arc::clone(&self.shared);
        let interval = self.interval;

        let mut builder = std::thread::Builder::new().name(LOOP_THREAD_NAME.into());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        let spawned = builder.spawn(move || {
            match thread_handoff.lock(|h| h.borrow_mut().take()) {
                Some(parts) => Some(run_loop_thread(parts, &shared, interval)),
                None => {
                    shared.finish(StopReason::Requested);
                    None
                }
            }
        });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                info!("Thermal management started");
                Ok(true)
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                self.parts = handoff.lock(|h| h.borrow_mut().take());
                error!("Failed to spawn '{}': {}", LOOP_THREAD_NAME, e);
                Err(LifecycleError::SpawnFailed.into())
            }
        }
    }

    /// Request a cooperative stop and wait up to `stop_timeout_ms`.
    ///
    /// Returns `true` if the loop is confirmed stopped.  On `false` the
    /// thread is still winding down; a later `start()` reports
    /// [`LifecycleError::StopPending`] until it exits.
    pub fn stop(&mut self) -> bool {
        self.shared.running.store(false, Ordering::Release);
        if self.worker.is_none() {
            return true;
        }
        self.shared.cancel.signal(());

        let exited = self.wait_for_exit(self.stop_timeout);
        if exited {
            if let Err(e) = self.reclaim() {
                warn!("Thermal loop exited but could not be reclaimed: {}", e);
            }
            info!("Thermal management stopped");
        } else {
            warn!(
                "Thermal loop did not exit within {} ms",
                self.stop_timeout.as_millis()
            );
        }
        exited
    }

    /// Wait up to `timeout` for the loop to stop on its own (emergency
    /// shutdown).  Returns `true` once it has stopped.
    pub fn wait_stopped(&mut self, timeout: Duration) -> bool {
        if self.worker.is_none() {
            return true;
        }
        let exited = self.wait_for_exit(timeout);
        if exited {
            if let Err(e) = self.reclaim() {
                warn!("Thermal loop exited but could not be reclaimed: {}", e);
            }
        }
        exited
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Latest status snapshot.
    ///
    /// While running this is the copy published after the last tick and
    /// may lag an in-flight tick by one interval.
    pub fn status(&self) -> StatusSnapshot {
        let mut snapshot = match &self.parts {
            Some(parts) => parts.service.status(false),
            None => self.shared.snapshot(),
        };
        snapshot.is_running = self.is_running();
        snapshot
    }

    // ── Internal ──────────────────────────────────────────────

    fn service_mut(&mut self) -> Result<&mut ThermalService> {
        if self.is_running() {
            return Err(LifecycleError::Running.into());
        }
        self.reclaim()?;
        self.parts
            .as_mut()
            .map(|p| &mut p.service)
            .ok_or_else(|| LifecycleError::WorkerLost.into())
    }

    /// Move the loop parts back from a finished worker thread.
    fn reclaim(&mut self) -> Result<()> {
        if self.parts.is_some() {
            return Ok(());
        }
        let Some(worker) = self.worker.take() else {
            return Err(LifecycleError::WorkerLost.into());
        };
        let finishing = self.shared.done.load(Ordering::Acquire);
        if !(finishing || worker.is_finished()) {
            self.worker = Some(worker);
            return Err(LifecycleError::StopPending.into());
        }
        match worker.join() {
            Ok(Some(parts)) => {
                self.parts = Some(parts);
                Ok(())
            }
            Ok(None) => Err(LifecycleError::WorkerLost.into()),
            Err(_) => {
                error!("Thermal loop thread panicked");
                Err(LifecycleError::WorkerLost.into())
            }
        }
    }

    fn wait_for_exit(&self, timeout: Duration) -> bool {
        if self.shared.done.load(Ordering::Acquire) {
            return true;
        }
        future::block_on(future::or(
            async {
                self.shared.exited.wait().await;
                true
            },
            async {
                async_io_mini::Timer::after(timeout).await;
                self.shared.done.load(Ordering::Acquire)
            },
        ))
    }
}

impl Drop for ThermalController {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}

// ── Loop thread ──────────────────────────────────────────────

/// Entry point for the loop thread.  Sets up the executor, drives the
/// control loop to completion and hands the parts back via `join()`.
fn run_loop_thread(mut parts: LoopParts, shared: &Shared, interval: Duration) -> LoopParts {
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    let reason = future::block_on(executor.run(control_loop(&mut parts, shared, interval)));

    shared.finish(reason);
    parts
}

async fn control_loop(parts: &mut LoopParts, shared: &Shared, interval: Duration) -> StopReason {
    let LoopParts { service, sink } = parts;

    sink.emit(&ThermalEvent::Started {
        sensors: service.sensors().len(),
        fans: service.fans().len(),
    });
    info!(
        "Starting thermal control loop ({} ms interval)",
        interval.as_millis()
    );

    let reason = loop {
        if !shared.running.load(Ordering::Acquire) {
            break StopReason::Requested;
        }

        // Failed ticks are already counted, logged and emitted by the
        // service; the loop just waits for the next interval.
        let outcome = service.tick(&mut **sink);
        shared.publish(service.status(true));

        if outcome == Ok(TickOutcome::Shutdown) {
            break StopReason::EmergencyShutdown;
        }

        if wait_or_cancel(&shared.cancel, interval).await {
            break StopReason::Requested;
        }
    };

    shared.publish(service.status(false));
    sink.emit(&ThermalEvent::Stopped(reason));
    reason
}

/// Sleep one interval.  Returns `true` if cancelled first.
async fn wait_or_cancel(cancel: &Signal<CriticalSectionRawMutex, ()>, interval: Duration) -> bool {
    future::or(
        async {
            cancel.wait().await;
            true
        },
        async {
            async_io_mini::Timer::after(interval).await;
            false
        },
    )
    .await
}
