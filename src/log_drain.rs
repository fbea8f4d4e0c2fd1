//! Log output over a TX-only UART.
//!
//! The main task becomes the log consumer once startup has finished: it
//! drains [`LogStream`] and writes each entry to UART1. Every 10 s it also
//! reports dropped log messages and, when edges arrived, a worker status line.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32 GPIO4 (TX) ──────▶ USB-UART RX
//!                           └─▶ PC Serial Monitor
//! ```

use crate::handshake::{Handshake, Parker};
use crate::logging::{format_to_buffer, LogEntry, LogStream};
use crate::worker::{level_name, WorkerSnapshot, WorkerStatus};

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::{self, UartTxDriver};

/// Size of the formatting buffer for one output line.
pub const LINE_BUF_LEN: usize = 160;

/// Interval between dropped-message reports.
pub const DROPPED_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Interval between worker status reports.
pub const STATUS_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Format log entry as `[timestamp_us] LEVEL: message\n`.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    format_to_buffer(
        buf,
        format_args!(
            "[{:10}] {}: {}\n",
            entry.timestamp_us,
            entry.level.as_str(),
            entry.message()
        ),
    )
}

/// Drain every ready entry into `sink`, one formatted line per call.
///
/// Returns the number of entries written.
pub fn drain_into<const N: usize>(stream: &LogStream<N>, mut sink: impl FnMut(&[u8])) -> usize {
    let mut buf = [0u8; LINE_BUF_LEN];
    let mut count = 0;

    while let Some(entry) = stream.drain() {
        let len = format_log_entry(&entry, &mut buf);
        sink(&buf[..len]);
        count += 1;
    }

    count
}

/// Tracks when dropped messages were last reported.
pub struct DroppedReporter {
    last_report_us: i64,
}

impl DroppedReporter {
    pub const fn new() -> Self {
        Self { last_report_us: 0 }
    }

    /// Every [`DROPPED_REPORT_INTERVAL_US`], format a warning line into `buf`
    /// if messages were dropped since the last report, and reset the counter.
    ///
    /// Returns the line length, or `None` when there is nothing to report.
    pub fn poll<const N: usize>(
        &mut self,
        stream: &LogStream<N>,
        now_us: i64,
        buf: &mut [u8],
    ) -> Option<usize> {
        if now_us - self.last_report_us <= DROPPED_REPORT_INTERVAL_US {
            return None;
        }
        self.last_report_us = now_us;

        let dropped = stream.dropped();
        if dropped == 0 {
            return None;
        }
        stream.reset_dropped();

        Some(format_to_buffer(
            buf,
            format_args!("[WARN] Dropped: {}\n", dropped),
        ))
    }
}

impl Default for DroppedReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format the worker status line.
///
/// `signals` counts every edge seen by the interrupt handler, `wakes` the
/// ones the worker accepted; the gap is what coalescing absorbed.
pub fn format_status(snapshot: &WorkerSnapshot, signals: u32, wakes: u32, buf: &mut [u8]) -> usize {
    format_to_buffer(
        buf,
        format_args!(
            "[STAT] edges={} wakes={} cycles={} output={} state={:?} write_failures={} last_error=0x{:x}\n",
            signals,
            wakes,
            snapshot.cycles,
            level_name(snapshot.level),
            snapshot.state,
            snapshot.write_failures,
            snapshot.last_error
        ),
    )
}

/// Periodic worker status report. Quiet while no new edge has arrived.
pub struct StatusReporter {
    last_report_us: i64,
    last_signals: u32,
}

impl StatusReporter {
    pub const fn new() -> Self {
        Self {
            last_report_us: 0,
            last_signals: 0,
        }
    }

    /// Every [`STATUS_REPORT_INTERVAL_US`], format a status line into `buf`
    /// if the handshake saw edges since the last report.
    pub fn poll<P: Parker>(
        &mut self,
        status: &WorkerStatus,
        handshake: &Handshake<P>,
        now_us: i64,
        buf: &mut [u8],
    ) -> Option<usize> {
        if now_us - self.last_report_us <= STATUS_REPORT_INTERVAL_US {
            return None;
        }
        self.last_report_us = now_us;

        let signals = handshake.signal_count();
        if signals == self.last_signals {
            return None;
        }
        self.last_signals = signals;

        Some(format_status(
            &status.snapshot(),
            signals,
            handshake.wake_count(),
            buf,
        ))
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize UART1 TX-only for logging output.
#[cfg(target_os = "espidf")]
pub fn init_uart_logger<'d>(
    uart: impl Peripheral<P = esp_idf_svc::hal::uart::UART1> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    baud_rate: u32,
) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
    let uart_config =
        uart::config::Config::default().baudrate(esp_idf_svc::hal::units::Hertz(baud_rate));

    UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}

/// Log consumer loop, plus the periodic status report. Never returns.
#[cfg(target_os = "espidf")]
pub fn uart_logger_task<P: Parker>(
    uart: &mut UartTxDriver<'_>,
    stream: &LogStream,
    status: &WorkerStatus,
    handshake: &Handshake<P>,
) -> ! {
    let mut reporter = DroppedReporter::new();
    let mut status_reporter = StatusReporter::new();
    let mut report_buf = [0u8; LINE_BUF_LEN];

    loop {
        let written = drain_into(stream, |line| {
            let _ = uart.write(line);
        });

        let now = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        if let Some(len) = reporter.poll(stream, now, &mut report_buf) {
            let _ = uart.write(&report_buf[..len]);
        }
        if let Some(len) = status_reporter.poll(status, handshake, now, &mut report_buf) {
            let _ = uart.write(&report_buf[..len]);
        }

        // If no work, wait before checking again
        if written == 0 {
            unsafe {
                esp_idf_svc::sys::vTaskDelay(10);
            }
        }
    }
}
