//! Global log stream instance.
//!
//! Producers: the startup sequence (main task) and the toggle worker.
//! Consumer: the UART drain running in the main task once startup is done.

use crate::logging::LogStream;

/// Firmware log stream.
pub static LOG_STREAM: LogStream = LogStream::new();
