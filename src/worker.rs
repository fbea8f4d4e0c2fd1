//! Deferred toggle worker.
//!
//! The task-context half of the edge handshake. Blocks on the [`Handshake`],
//! and on each wake inverts the output state and writes it to the pin.
//!
//! # State machine
//!
//! ```text
//!            start()              wait() returns
//!  Active ───────────▶ Blocked ──────────────────▶ Active
//!  (boot)                 ▲                          │
//!                         └──────── body done ───────┘
//! ```
//!
//! No terminal state. A failed write is logged and counted, then the worker
//! goes back to Blocked like any other cycle.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};

use crate::error::WriteError;
use crate::hal::{Clock, PinId, PinWriter, TaskBody};
use crate::handshake::{Handshake, Parker};
use crate::logging::LogStream;
use crate::{rt_debug, rt_error, rt_info};

/// Worker execution state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Running startup or a toggle body.
    Active = 0,
    /// Waiting on the handshake.
    Blocked = 1,
}

impl WorkerState {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Blocked,
            _ => WorkerState::Active,
        }
    }
}

/// Published view of the worker, readable from any task.
///
/// Written only by the worker. Diagnostic copy: the worker's own `level` is
/// the output state, this is a mirror of it.
pub struct WorkerStatus {
    state: AtomicU8,
    level: AtomicBool,
    /// Completed toggle cycles, failed writes included.
    cycles: AtomicU32,
    write_failures: AtomicU32,
    /// Platform code of the most recent failed write (0 if none).
    last_error: AtomicI32,
}

impl WorkerStatus {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(WorkerState::Active as u8),
            level: AtomicBool::new(false),
            cycles: AtomicU32::new(0),
            write_failures: AtomicU32::new(0),
            last_error: AtomicI32::new(0),
        }
    }

    #[inline]
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    #[inline]
    pub fn cycles(&self) -> u32 {
        self.cycles.load(Ordering::Acquire)
    }

    #[inline]
    pub fn write_failures(&self) -> u32 {
        self.write_failures.load(Ordering::Acquire)
    }

    /// Get a snapshot of the current worker status.
    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            state: self.state(),
            level: self.level(),
            cycles: self.cycles(),
            write_failures: self.write_failures(),
            last_error: self.last_error.load(Ordering::Acquire),
        }
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn record(&self, level: bool, failure: Option<&WriteError>) {
        self.level.store(level, Ordering::Release);
        if let Some(err) = failure {
            self.last_error.store(err.source.code(), Ordering::Release);
            self.write_failures.fetch_add(1, Ordering::AcqRel);
        }
        self.cycles.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of worker status at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerSnapshot {
    pub state: WorkerState,
    pub level: bool,
    pub cycles: u32,
    pub write_failures: u32,
    pub last_error: i32,
}

/// Toggles the output pin once per accepted wake signal.
///
/// Owns the output state outright: nothing outside this struct reads or
/// writes `level`, and interrupt context never sees it.
pub struct ToggleWorker<'a, P: Parker, O> {
    handshake: &'a Handshake<P>,
    io: O,
    pin: PinId,
    level: bool,
    status: &'a WorkerStatus,
    log: &'a LogStream,
}

impl<'a, P, O> ToggleWorker<'a, P, O>
where
    P: Parker,
    O: PinWriter + Clock,
{
    /// Create a worker driving `pin`, starting from output state low.
    pub fn new(
        handshake: &'a Handshake<P>,
        io: O,
        pin: PinId,
        status: &'a WorkerStatus,
        log: &'a LogStream,
    ) -> Self {
        Self {
            handshake,
            io,
            pin,
            level: false,
            status,
            log,
        }
    }

    /// Current output state.
    #[inline]
    pub fn level(&self) -> bool {
        self.level
    }

    #[inline]
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// One-time initialization, then Blocked.
    pub fn start(&mut self) {
        rt_info!(
            self.log,
            self.io.uptime_us(),
            "Toggle worker started on {}, output {}",
            self.pin,
            level_name(self.level)
        );
        self.status.set_state(WorkerState::Blocked);
    }

    /// Block until signaled, then run one toggle body.
    ///
    /// Returns the new output state, or the write failure of this cycle. The
    /// state has flipped either way.
    pub fn step(&mut self) -> Result<bool, WriteError> {
        self.status.set_state(WorkerState::Blocked);
        self.handshake.wait();
        self.status.set_state(WorkerState::Active);

        let result = self.toggle();

        self.status.set_state(WorkerState::Blocked);
        result
    }

    /// Toggle body: invert, write, report.
    fn toggle(&mut self) -> Result<bool, WriteError> {
        let now = self.io.uptime_us();
        rt_debug!(self.log, now, "Interrupted");

        self.level = !self.level;
        rt_info!(self.log, now, "Setting output {}", level_name(self.level));

        let result = self
            .io
            .write_pin(self.pin, self.level)
            .map_err(|source| WriteError {
                pin: self.pin,
                level: self.level,
                source,
            });

        if let Err(err) = &result {
            rt_error!(self.log, self.io.uptime_us(), "{}", err);
        }
        self.status.record(self.level, result.as_ref().err());

        result.map(|()| self.level)
    }
}

impl<P, O> TaskBody for ToggleWorker<'_, P, O>
where
    P: Parker,
    O: PinWriter + Clock + Send,
{
    fn run(&mut self) -> ! {
        self.start();
        loop {
            // Write failures are already logged and counted; keep serving edges.
            let _ = self.step();
        }
    }
}

/// "high" / "low", as used in log lines and errors.
pub(crate) fn level_name(level: bool) -> &'static str {
    if level {
        "high"
    } else {
        "low"
    }
}
