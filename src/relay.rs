//! Edge interrupt handler.
//!
//! Runs in interrupt context on every detected edge of the input pin and does
//! exactly one thing: raise the worker's wake signal. No I/O, no logging, no
//! output state.

use crate::hal::IsrHandler;
use crate::handshake::{Notifier, Parker};

/// Relays a hardware edge to the deferred toggle worker.
pub struct EdgeRelay<'a, P: Parker> {
    notifier: Notifier<'a, P>,
}

impl<'a, P: Parker> EdgeRelay<'a, P> {
    /// Usable in a `static` initializer:
    ///
    /// ```ignore
    /// static HANDSHAKE: Handshake<EspParker> = Handshake::new(EspParker::new());
    /// static RELAY: EdgeRelay<'static, EspParker> = EdgeRelay::new(HANDSHAKE.notifier());
    /// ```
    pub const fn new(notifier: Notifier<'a, P>) -> Self {
        Self { notifier }
    }
}

impl<P: Parker> IsrHandler for EdgeRelay<'_, P> {
    #[inline]
    fn on_edge(&self) {
        self.notifier.signal();
    }
}
