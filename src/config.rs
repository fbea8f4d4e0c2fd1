//! Module: config
//!
//! Purpose: Build-time board configuration.
//!
//! There is no runtime configuration, no environment and no persisted
//! state. The two pin numbers, the worker task parameters and the log UART
//! baud rate are fixed here and compiled in.

use core::ffi::CStr;

use crate::hal::{EdgeTrigger, PinConfig, PinId, TaskSpec};

/// Board wiring and task parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardConfig {
    /// Edge-triggered input (GPIO6..GPIO11 are flash pins and cannot interrupt on ESP32).
    pub input_pin: PinId,
    /// Toggled output.
    pub output_pin: PinId,
    /// Edge that wakes the worker.
    pub trigger: EdgeTrigger,
    pub worker_name: &'static CStr,
    pub worker_priority: u32,
    pub worker_stack_bytes: u32,
    /// Interrupt allocation flags for the GPIO ISR service.
    pub isr_flags: i32,
    /// Baud rate of the log UART (UART1, TX on GPIO4).
    pub log_baud_rate: u32,
}

impl BoardConfig {
    /// Input: pull-up on, pull-down off, interrupt on `trigger`.
    pub const fn input_pin_config(&self) -> PinConfig {
        PinConfig::pulled_up_input(self.trigger)
    }

    /// Output: no pulls, no interrupt.
    pub const fn output_pin_config(&self) -> PinConfig {
        PinConfig::output()
    }

    pub const fn worker_task(&self) -> TaskSpec {
        TaskSpec {
            name: self.worker_name,
            priority: self.worker_priority,
            stack_bytes: self.worker_stack_bytes,
        }
    }
}

/// The board this firmware is built for.
pub const BOARD: BoardConfig = BoardConfig {
    input_pin: PinId::new(18),
    output_pin: PinId::new(17),
    trigger: EdgeTrigger::Rising,
    worker_name: c"interruptTask",
    worker_priority: 10,
    worker_stack_bytes: 4096,
    isr_flags: 0,
    log_baud_rate: 115_200,
};
