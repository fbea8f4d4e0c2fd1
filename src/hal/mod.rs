//! Platform abstraction layer for the edge toggler.
//!
//! The core never touches registers or RTOS calls directly. Everything it
//! needs from the board comes through the traits below:
//!
//! - [`PinControl`]: one-time pin setup (direction, pulls, edge trigger)
//! - [`PinWriter`]: output level writes from task context
//! - [`EdgeInterrupts`]: routing a pin's edge interrupt to an [`IsrHandler`]
//! - [`TaskSpawner`]: creating the worker task
//! - [`Clock`]: microsecond uptime for log timestamps
//!
//! [`esp`] implements them on ESP-IDF. Host tests provide mocks.

pub mod gpio;

#[cfg(target_os = "espidf")]
pub mod esp;

use core::ffi::CStr;

pub use gpio::{Direction, EdgeTrigger, PinConfig, PinId};

/// Raw status code returned by a failing platform call (`esp_err_t` on ESP-IDF).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlatformError {
    code: i32,
}

impl PlatformError {
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    #[inline]
    pub const fn code(&self) -> i32 {
        self.code
    }
}

impl core::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "platform error {} (0x{:x})", self.code, self.code)
    }
}

/// Code run in interrupt context when an edge is detected.
///
/// # Contract
///
/// Implementations run with interrupts masked and must:
/// - return in bounded, short time
/// - never block, allocate, log or perform I/O
///
/// Only `&self` is available, so an implementation can reach nothing but the
/// shared, interrupt-safe state it was built with.
pub trait IsrHandler: Sync {
    fn on_edge(&self);
}

/// Entry point of a long-lived task. Never returns.
pub trait TaskBody: Send {
    fn run(&mut self) -> !;
}

/// Creation parameters for a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: &'static CStr,
    pub priority: u32,
    pub stack_bytes: u32,
}

/// Opaque handle to a spawned task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskHandle(usize);

impl TaskHandle {
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> usize {
        self.0
    }
}

/// Static pin configuration.
pub trait PinControl {
    fn configure_pin(&mut self, pin: PinId, config: &PinConfig) -> Result<(), PlatformError>;

    /// Dump the IO configuration of every pin configured so far.
    ///
    /// Diagnostic only. Platforms without a dump facility keep the default.
    fn dump_configuration(&mut self) -> Result<(), PlatformError> {
        Ok(())
    }
}

/// Output level writes. Task context only.
pub trait PinWriter {
    fn write_pin(&mut self, pin: PinId, level: bool) -> Result<(), PlatformError>;
}

/// Edge interrupt routing.
pub trait EdgeInterrupts {
    /// Route edge interrupts of `pin` to `handler` for the rest of the program.
    fn register_edge_handler<H: IsrHandler>(
        &mut self,
        pin: PinId,
        handler: &'static H,
    ) -> Result<(), PlatformError>;
}

/// Task creation.
pub trait TaskSpawner {
    /// Start `body` as a new task. The body lives for the rest of the program.
    fn spawn<T: TaskBody>(
        &mut self,
        spec: &TaskSpec,
        body: &'static mut T,
    ) -> Result<TaskHandle, PlatformError>;
}

/// Monotonic uptime source.
pub trait Clock {
    fn uptime_us(&self) -> i64;
}

/// Everything the startup sequence needs from a board.
pub trait Platform: PinControl + EdgeInterrupts + TaskSpawner + Clock {}

impl<T: PinControl + EdgeInterrupts + TaskSpawner + Clock> Platform for T {}
