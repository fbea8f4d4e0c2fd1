//! Startup sequence.
//!
//! Strict order, fail-fast:
//!
//! 1. configure input pin (pull-up, edge interrupt)
//! 2. configure output pin (no pulls)
//! 3. dump IO configuration (diagnostic, failure only warns)
//! 4. register the edge handler on the input pin
//! 5. spawn the worker task
//!
//! Any failing step in 1, 2, 4 or 5 returns immediately. Nothing after it
//! runs, so the system is never left with an interrupt armed and no worker,
//! or a worker with unconfigured pins.

use crate::config::BoardConfig;
use crate::error::StartupError;
use crate::hal::{IsrHandler, Platform, PlatformError, TaskBody, TaskHandle};
use crate::logging::LogStream;
use crate::{rt_error, rt_info, rt_warn};

/// Configure the pins, hook `relay` to the input edge and start `worker`.
///
/// Returns the worker's task handle once the system is armed.
pub fn arm<Pal, H, T>(
    platform: &mut Pal,
    board: &BoardConfig,
    relay: &'static H,
    worker: &'static mut T,
    log: &LogStream,
) -> Result<TaskHandle, StartupError>
where
    Pal: Platform,
    H: IsrHandler,
    T: TaskBody,
{
    rt_info!(log, platform.uptime_us(), "Configuring input pin {}", board.input_pin);
    let input = board.input_pin_config();
    let result = platform.configure_pin(board.input_pin, &input);
    check(log, platform, result, StartupError::ConfigureInput)?;

    rt_info!(log, platform.uptime_us(), "Configuring output pin {}", board.output_pin);
    let output = board.output_pin_config();
    let result = platform.configure_pin(board.output_pin, &output);
    check(log, platform, result, StartupError::ConfigureOutput)?;

    if let Err(err) = platform.dump_configuration() {
        rt_warn!(log, platform.uptime_us(), "IO configuration dump failed: {}", err);
    }

    rt_info!(log, platform.uptime_us(), "Registering edge handler on {}", board.input_pin);
    let result = platform.register_edge_handler(board.input_pin, relay);
    check(log, platform, result, StartupError::RegisterHandler)?;

    let spec = board.worker_task();
    let result = platform.spawn(&spec, worker);
    let handle = check(log, platform, result, StartupError::SpawnWorker)?;

    rt_info!(
        log,
        platform.uptime_us(),
        "Armed: {:?} edge on {} toggles {}",
        board.trigger,
        board.input_pin,
        board.output_pin
    );
    Ok(handle)
}

fn check<Pal: Platform, R>(
    log: &LogStream,
    platform: &Pal,
    result: Result<R, PlatformError>,
    step: fn(PlatformError) -> StartupError,
) -> Result<R, StartupError> {
    result.map_err(|source| {
        let err = step(source);
        rt_error!(log, platform.uptime_us(), "{}", err);
        err
    })
}
