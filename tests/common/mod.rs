//! Host stand-ins for the board: a thread-based parker and a recording platform.
//!
//! Threads model the two contexts: `fire_edge` plays the interrupt, spawned
//! tasks are std threads.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use edge_toggle::hal::{
    Clock, EdgeInterrupts, IsrHandler, PinConfig, PinControl, PinId, PinWriter, PlatformError,
    TaskBody, TaskHandle, TaskSpawner, TaskSpec,
};
use edge_toggle::handshake::Parker;

/// Token parker built on a condvar, same contract as a task notification.
#[derive(Default)]
pub struct ThreadParker {
    token: Mutex<bool>,
    cv: Condvar,
    parks: AtomicUsize,
}

impl ThreadParker {
    pub fn parks(&self) -> usize {
        self.parks.load(Ordering::Relaxed)
    }
}

impl Parker for ThreadParker {
    fn bind_current(&self) {}

    fn park(&self) {
        self.parks.fetch_add(1, Ordering::Relaxed);
        let mut token = self.token.lock().unwrap();
        while !*token {
            token = self.cv.wait(token).unwrap();
        }
        *token = false;
    }

    fn unpark_from_isr(&self) {
        *self.token.lock().unwrap() = true;
        self.cv.notify_one();
    }
}

/// Platform call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Configure(PinId, PinConfig),
    Dump,
    Register(PinId),
    Spawn(String),
}

/// Which platform step should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Configure(PinId),
    Dump,
    Register,
    Spawn,
}

pub const MOCK_ERROR: PlatformError = PlatformError::new(0x103);

struct MockState {
    calls: Vec<Call>,
    fail: Vec<FailAt>,
    handlers: Vec<(PinId, &'static dyn IsrHandler)>,
    writes: Vec<(PinId, bool)>,
    failing_writes: Vec<usize>,
}

/// Recording platform. Clones share state, so one clone can be handed to the
/// worker as its writer while the test keeps another.
#[derive(Clone)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
    boot: Instant,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                fail: Vec::new(),
                handlers: Vec::new(),
                writes: Vec::new(),
                failing_writes: Vec::new(),
            })),
            boot: Instant::now(),
        }
    }

    pub fn failing_at(step: FailAt) -> Self {
        let platform = Self::new();
        platform.state.lock().unwrap().fail.push(step);
        platform
    }

    /// Make the write with this zero-based index fail.
    pub fn fail_write(&self, index: usize) {
        self.state.lock().unwrap().failing_writes.push(index);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<(PinId, bool)> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn handler_count(&self) -> usize {
        self.state.lock().unwrap().handlers.len()
    }

    /// Simulate a hardware edge: run every handler registered on `pin`.
    pub fn fire_edge(&self, pin: PinId) {
        let handlers: Vec<&'static dyn IsrHandler> = self
            .state
            .lock()
            .unwrap()
            .handlers
            .iter()
            .filter(|(p, _)| *p == pin)
            .map(|(_, h)| *h)
            .collect();

        for handler in handlers {
            handler.on_edge();
        }
    }

    fn fails(&self, step: FailAt) -> bool {
        self.state.lock().unwrap().fail.contains(&step)
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl PinControl for MockPlatform {
    fn configure_pin(&mut self, pin: PinId, config: &PinConfig) -> Result<(), PlatformError> {
        self.record(Call::Configure(pin, *config));
        if self.fails(FailAt::Configure(pin)) {
            return Err(MOCK_ERROR);
        }
        Ok(())
    }

    fn dump_configuration(&mut self) -> Result<(), PlatformError> {
        self.record(Call::Dump);
        if self.fails(FailAt::Dump) {
            return Err(MOCK_ERROR);
        }
        Ok(())
    }
}

impl PinWriter for MockPlatform {
    fn write_pin(&mut self, pin: PinId, level: bool) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        let index = state.writes.len();
        state.writes.push((pin, level));
        if state.failing_writes.contains(&index) {
            return Err(MOCK_ERROR);
        }
        Ok(())
    }
}

impl EdgeInterrupts for MockPlatform {
    fn register_edge_handler<H: IsrHandler>(
        &mut self,
        pin: PinId,
        handler: &'static H,
    ) -> Result<(), PlatformError> {
        self.record(Call::Register(pin));
        if self.fails(FailAt::Register) {
            return Err(MOCK_ERROR);
        }
        let handler: &'static dyn IsrHandler = handler;
        self.state.lock().unwrap().handlers.push((pin, handler));
        Ok(())
    }
}

impl TaskSpawner for MockPlatform {
    fn spawn<T: TaskBody>(
        &mut self,
        spec: &TaskSpec,
        body: &'static mut T,
    ) -> Result<TaskHandle, PlatformError> {
        let name = spec.name.to_str().unwrap_or("task").to_string();
        self.record(Call::Spawn(name.clone()));
        if self.fails(FailAt::Spawn) {
            return Err(MOCK_ERROR);
        }

        thread::Builder::new()
            .name(name)
            .spawn(move || {
                body.run();
            })
            .map_err(|_| MOCK_ERROR)?;

        Ok(TaskHandle::from_raw(1))
    }
}

impl Clock for MockPlatform {
    fn uptime_us(&self) -> i64 {
        self.boot.elapsed().as_micros() as i64
    }
}

/// Give a value the `'static` lifetime the firmware gets from its statics.
pub fn leak<T>(value: T) -> &'static mut T {
    Box::leak(Box::new(value))
}

/// Poll `cond` until it holds or `timeout` expires.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}
