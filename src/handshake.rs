//! One-shot wake signal between interrupt context and the worker task.
//!
//! # Semantics
//!
//! ```text
//! ISR                   Handshake              Worker task
//! ───                   ─────────              ───────────
//!
//! signal() ──────────▶ pending: idle→pending ──▶ wait() returns
//! signal() ──────────▶ pending already set       (coalesced)
//!                                                wait() blocks again
//! ```
//!
//! - A single pending slot. N signals before a `wait()` wake the worker once.
//!   This is the lossy-coalescing policy: at least one wake per edge burst,
//!   not one wake per edge.
//! - No lost wakeup. A signal that lands before `wait()` is called, or
//!   between the pending check and the block, is still observed.
//! - A signal that lands while the worker is busy toggling stays pending and
//!   makes the next `wait()` return immediately.
//!
//! The blocking mechanism itself is the platform's, behind [`Parker`].

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Blocking primitive for the waiting task.
///
/// `unpark_from_isr` must behave like a token: an unpark that happens before
/// the matching `park` makes that `park` return immediately. FreeRTOS task
/// notifications and `std::thread::park` both work this way.
pub trait Parker: Sync {
    /// Record the calling task as the one `unpark_from_isr` wakes.
    ///
    /// Called at the start of every `wait()`, from task context.
    fn bind_current(&self);

    /// Block the bound task until unparked. Spurious returns are allowed.
    fn park(&self);

    /// Wake the bound task.
    ///
    /// Interrupt-safe: never blocks, never allocates, total. A no-op while no
    /// task is bound.
    fn unpark_from_isr(&self);
}

/// The handshake token plus the parker that blocks on it.
///
/// Built once (usually in a `static`) and shared by reference between the
/// ISR side, through [`Notifier`], and the single waiting task.
pub struct Handshake<P: Parker> {
    pending: AtomicBool,
    /// Signals raised since boot, coalesced or not.
    signals: AtomicU32,
    /// Signals accepted by `wait()`.
    wakes: AtomicU32,
    parker: P,
}

impl<P: Parker> Handshake<P> {
    pub const fn new(parker: P) -> Self {
        Self {
            pending: AtomicBool::new(false),
            signals: AtomicU32::new(0),
            wakes: AtomicU32::new(0),
            parker,
        }
    }

    /// Interrupt-side handle. The only way to raise a signal.
    #[inline]
    pub const fn notifier(&self) -> Notifier<'_, P> {
        Notifier { handshake: self }
    }

    /// Block until a signal has been raised since the last `wait()` returned.
    ///
    /// Task context only. Returns once per accepted (coalesced) signal.
    pub fn wait(&self) {
        self.parker.bind_current();

        loop {
            if self.try_take() {
                return;
            }
            self.parker.park();
        }
    }

    /// Consume a pending signal without blocking.
    #[inline]
    pub fn try_take(&self) -> bool {
        if self.pending.swap(false, Ordering::AcqRel) {
            self.wakes.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// True while a signal is waiting to be consumed.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Total signals raised since boot.
    #[inline]
    pub fn signal_count(&self) -> u32 {
        self.signals.load(Ordering::Relaxed)
    }

    /// Total wakes delivered since boot.
    #[inline]
    pub fn wake_count(&self) -> u32 {
        self.wakes.load(Ordering::Relaxed)
    }

    pub fn parker(&self) -> &P {
        &self.parker
    }

    #[inline]
    fn signal(&self) {
        self.signals.fetch_add(1, Ordering::Relaxed);

        // Only the idle→pending transition needs to wake the task. If the slot
        // was already set, the earlier signal's unpark is still outstanding.
        if !self.pending.swap(true, Ordering::AcqRel) {
            self.parker.unpark_from_isr();
        }
    }
}

/// Interrupt-safe signal handle.
///
/// Exposes nothing but [`Notifier::signal`], so interrupt code holding it
/// cannot reach the blocking side of the handshake.
pub struct Notifier<'a, P: Parker> {
    handshake: &'a Handshake<P>,
}

impl<'a, P: Parker> Notifier<'a, P> {
    /// Raise the wake signal. Non-blocking, allocation-free, never fails.
    ///
    /// Safe to call whether or not the worker is currently waiting.
    #[inline]
    pub fn signal(&self) {
        self.handshake.signal();
    }
}

impl<P: Parker> Clone for Notifier<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: Parker> Copy for Notifier<'_, P> {}
