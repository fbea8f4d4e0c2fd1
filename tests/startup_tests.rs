//! Startup sequence tests: ordering, fail-fast, end-to-end wiring

mod common;

use std::time::Duration;

use common::{leak, wait_until, Call, FailAt, MockPlatform, ThreadParker, MOCK_ERROR};
use edge_toggle::config::BOARD;
use edge_toggle::error::StartupError;
use edge_toggle::handshake::Handshake;
use edge_toggle::logging::{LogLevel, LogStream};
use edge_toggle::relay::EdgeRelay;
use edge_toggle::startup;
use edge_toggle::worker::{ToggleWorker, WorkerStatus};

const TIMEOUT: Duration = Duration::from_secs(2);

type Worker = ToggleWorker<'static, ThreadParker, MockPlatform>;

struct System {
    platform: MockPlatform,
    relay: &'static EdgeRelay<'static, ThreadParker>,
    worker: &'static mut Worker,
    status: &'static WorkerStatus,
    log: &'static LogStream,
}

fn system(platform: MockPlatform) -> System {
    let handshake: &'static Handshake<ThreadParker> = leak(Handshake::new(ThreadParker::default()));
    let status: &'static WorkerStatus = leak(WorkerStatus::new());
    let log: &'static LogStream = leak(LogStream::new());
    let worker = leak(ToggleWorker::new(
        handshake,
        platform.clone(),
        BOARD.output_pin,
        status,
        log,
    ));

    System {
        relay: leak(EdgeRelay::new(handshake.notifier())),
        platform,
        worker,
        status,
        log,
    }
}

fn arm(sys: System) -> (Result<(), StartupError>, MockPlatform, &'static WorkerStatus, &'static LogStream) {
    let mut platform = sys.platform.clone();
    let result = startup::arm(&mut platform, &BOARD, sys.relay, sys.worker, sys.log).map(|_| ());
    (result, sys.platform, sys.status, sys.log)
}

fn log_lines(log: &LogStream, level: LogLevel) -> Vec<String> {
    std::iter::from_fn(|| log.drain())
        .filter(|e| e.level == level)
        .map(|e| e.message().to_string())
        .collect()
}

#[test]
fn test_arm_runs_steps_in_order() {
    let (result, platform, _, _) = arm(system(MockPlatform::new()));
    assert_eq!(result, Ok(()));

    assert_eq!(
        platform.calls(),
        vec![
            Call::Configure(BOARD.input_pin, BOARD.input_pin_config()),
            Call::Configure(BOARD.output_pin, BOARD.output_pin_config()),
            Call::Dump,
            Call::Register(BOARD.input_pin),
            Call::Spawn("interruptTask".to_string()),
        ]
    );
    assert_eq!(platform.handler_count(), 1);
}

#[test]
fn test_input_failure_stops_everything() {
    let (result, platform, _, log) = arm(system(MockPlatform::failing_at(FailAt::Configure(
        BOARD.input_pin,
    ))));

    assert_eq!(result, Err(StartupError::ConfigureInput(MOCK_ERROR)));
    assert_eq!(
        platform.calls(),
        vec![Call::Configure(BOARD.input_pin, BOARD.input_pin_config())]
    );
    assert_eq!(platform.handler_count(), 0);

    let errors = log_lines(log, LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("S01"));
}

#[test]
fn test_output_failure_never_registers_or_spawns() {
    let (result, platform, _, _) = arm(system(MockPlatform::failing_at(FailAt::Configure(
        BOARD.output_pin,
    ))));

    assert_eq!(result, Err(StartupError::ConfigureOutput(MOCK_ERROR)));
    let calls = platform.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls.iter().any(|c| matches!(c, Call::Register(_) | Call::Spawn(_))));
    assert_eq!(platform.handler_count(), 0);
}

#[test]
fn test_register_failure_never_spawns() {
    let (result, platform, status, _) = arm(system(MockPlatform::failing_at(FailAt::Register)));

    assert_eq!(result, Err(StartupError::RegisterHandler(MOCK_ERROR)));
    assert!(!platform.calls().iter().any(|c| matches!(c, Call::Spawn(_))));
    assert_eq!(platform.handler_count(), 0);
    assert_eq!(status.cycles(), 0);
}

#[test]
fn test_spawn_failure_reported() {
    let (result, platform, _, log) = arm(system(MockPlatform::failing_at(FailAt::Spawn)));

    assert_eq!(result, Err(StartupError::SpawnWorker(MOCK_ERROR)));
    assert_eq!(platform.calls().len(), 5);
    assert!(log_lines(log, LogLevel::Error)[0].starts_with("S04"));
}

#[test]
fn test_dump_failure_only_warns() {
    let (result, platform, _, log) = arm(system(MockPlatform::failing_at(FailAt::Dump)));

    assert_eq!(result, Ok(()));
    assert_eq!(platform.handler_count(), 1);

    let warnings = log_lines(log, LogLevel::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("IO configuration dump failed"));
}

#[test]
fn test_armed_system_toggles_on_input_edges() {
    let (result, platform, status, _) = arm(system(MockPlatform::new()));
    assert_eq!(result, Ok(()));

    platform.fire_edge(BOARD.input_pin);
    assert!(wait_until(TIMEOUT, || status.cycles() == 1));
    assert!(status.level());

    // Edges on other pins go nowhere
    platform.fire_edge(BOARD.output_pin);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(status.cycles(), 1);

    platform.fire_edge(BOARD.input_pin);
    assert!(wait_until(TIMEOUT, || status.cycles() == 2));
    assert!(!status.level());

    assert_eq!(
        platform.writes(),
        vec![(BOARD.output_pin, true), (BOARD.output_pin, false)]
    );
}

#[test]
fn test_armed_system_survives_write_failure() {
    let sys = system(MockPlatform::new());
    sys.platform.fail_write(0);
    let (result, platform, status, _) = arm(sys);
    assert_eq!(result, Ok(()));

    platform.fire_edge(BOARD.input_pin);
    assert!(wait_until(TIMEOUT, || status.cycles() == 1));
    assert_eq!(status.write_failures(), 1);
    assert!(status.level());

    platform.fire_edge(BOARD.input_pin);
    assert!(wait_until(TIMEOUT, || status.cycles() == 2));
    assert!(!status.level());
    assert_eq!(status.write_failures(), 1);
}
