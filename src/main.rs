//! EdgeToggle - Main entry point
//!
//! 1. Bring up the log UART
//! 2. Arm the system: pins, edge handler, worker task
//! 3. Stay in the main task as the log consumer and status reporter

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::sys as esp_idf_sys;
    use static_cell::StaticCell;

    use edge_toggle::{
        config::BOARD,
        hal::esp::{EspIo, EspParker, EspPlatform},
        hal::Clock,
        handshake::Handshake,
        log_drain,
        relay::EdgeRelay,
        rt_error, rt_info,
        startup,
        worker::{ToggleWorker, WorkerStatus},
        LOG_STREAM,
    };

    type Worker = ToggleWorker<'static, EspParker, EspIo>;

    // Static allocations: nothing is allocated after boot.
    static HANDSHAKE: Handshake<EspParker> = Handshake::new(EspParker::new());
    static RELAY: EdgeRelay<'static, EspParker> = EdgeRelay::new(HANDSHAKE.notifier());
    static STATUS: WorkerStatus = WorkerStatus::new();
    static WORKER: StaticCell<Worker> = StaticCell::new();

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        let mut platform = EspPlatform::new(BOARD.isr_flags);
        rt_info!(LOG_STREAM, platform.uptime_us(), "{}", env!("VERSION_STRING"));

        let worker = WORKER.init(ToggleWorker::new(
            &HANDSHAKE,
            platform.io(),
            BOARD.output_pin,
            &STATUS,
            &LOG_STREAM,
        ));

        match startup::arm(&mut platform, &BOARD, &RELAY, worker, &LOG_STREAM) {
            Ok(task) => rt_info!(
                LOG_STREAM,
                platform.uptime_us(),
                "Worker task {:?} running (handle 0x{:x})",
                BOARD.worker_name,
                task.as_raw()
            ),
            // Never armed: no interrupt response, only this diagnostic.
            Err(err) => rt_error!(LOG_STREAM, platform.uptime_us(), "Startup aborted: {}", err),
        }

        let uart = Peripherals::take().and_then(|p| {
            log_drain::init_uart_logger(p.uart1, p.pins.gpio4, BOARD.log_baud_rate)
        });

        match uart {
            Ok(mut uart) => {
                log_drain::uart_logger_task(&mut uart, &LOG_STREAM, &STATUS, &HANDSHAKE)
            }
            // No log sink: keep the main task parked.
            Err(_) => loop {
                unsafe {
                    esp_idf_sys::vTaskDelay(1000);
                }
            },
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "edge-toggle is ESP-IDF firmware; build it for an espidf target (e.g. xtensa-esp32-espidf)"
    );
    std::process::exit(1);
}
