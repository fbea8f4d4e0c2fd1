//! Error taxonomy.
//!
//! - [`StartupError`]: pin setup, interrupt registration or worker creation
//!   failed. Fatal: the system never arms.
//! - [`WriteError`]: an output write failed during a toggle cycle.
//!   Recoverable: logged, counted, and the worker waits for the next edge.
//!
//! Interrupt context has no error channel at all.

use crate::hal::{PinId, PlatformError};
use crate::worker::level_name;

/// Startup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    /// S01: input pin configuration failed
    ConfigureInput(PlatformError),
    /// S02: output pin configuration failed
    ConfigureOutput(PlatformError),
    /// S03: ISR service or edge handler registration failed
    RegisterHandler(PlatformError),
    /// S04: worker task could not be created
    SpawnWorker(PlatformError),
}

impl StartupError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigureInput(_) => "S01",
            Self::ConfigureOutput(_) => "S02",
            Self::RegisterHandler(_) => "S03",
            Self::SpawnWorker(_) => "S04",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::ConfigureInput(_) => "input pin configuration failed",
            Self::ConfigureOutput(_) => "output pin configuration failed",
            Self::RegisterHandler(_) => "edge handler registration failed",
            Self::SpawnWorker(_) => "worker task creation failed",
        }
    }

    /// Underlying platform error.
    pub fn source(&self) -> PlatformError {
        match *self {
            Self::ConfigureInput(e)
            | Self::ConfigureOutput(e)
            | Self::RegisterHandler(e)
            | Self::SpawnWorker(e) => e,
        }
    }
}

impl core::fmt::Display for StartupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}: {}", self.code(), self.message(), self.source())
    }
}

/// Failed output write for one toggle cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteError {
    pub pin: PinId,
    /// Level that should have been written.
    pub level: bool,
    pub source: PlatformError,
}

impl core::fmt::Display for WriteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "write_pin(): failed for {} ({}): {}",
            self.pin,
            level_name(self.level),
            self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_error_codes() {
        let e = PlatformError::new(-1);
        assert_eq!(StartupError::ConfigureInput(e).code(), "S01");
        assert_eq!(StartupError::ConfigureOutput(e).code(), "S02");
        assert_eq!(StartupError::RegisterHandler(e).code(), "S03");
        assert_eq!(StartupError::SpawnWorker(e).code(), "S04");
    }

    #[test]
    fn test_startup_error_display() {
        let err = StartupError::ConfigureOutput(PlatformError::new(0x103));
        assert_eq!(
            err.to_string(),
            "S02: output pin configuration failed: platform error 259 (0x103)"
        );
        assert_eq!(err.source().code(), 0x103);
    }

    #[test]
    fn test_write_error_display() {
        let err = WriteError {
            pin: PinId::new(17),
            level: true,
            source: PlatformError::new(-1),
        };
        let text = err.to_string();
        assert!(text.starts_with("write_pin(): failed for GPIO17 (high)"));

        let low = WriteError { level: false, ..err };
        assert!(low.to_string().starts_with("write_pin(): failed for GPIO17 (low):"));
    }
}
