//! # EdgeToggle
//!
//! Toggles one output pin on every rising edge of one input pin.
//!
//! ## Architecture
//!
//! ```text
//! hardware edge ──▶ EdgeRelay (ISR) ──signal()──▶ Handshake ──wait()──▶ ToggleWorker (task)
//!                                                                        │
//!                                                                        ▼
//!                                                                   write_pin()
//! ```
//!
//! - The interrupt handler only raises a coalescing one-shot signal
//! - The worker owns the output state and does all the I/O and logging
//! - Board specifics sit behind the [`hal`] traits; [`startup::arm`] wires
//!   everything together, fail-fast

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod hal;
pub mod handshake;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod relay;
pub mod startup;
pub mod worker;

pub use config::BOARD;
pub use error::{StartupError, WriteError};
pub use handshake::{Handshake, Notifier, Parker};
pub use log_globals::LOG_STREAM;
pub use relay::EdgeRelay;
pub use worker::{ToggleWorker, WorkerState, WorkerStatus};
