//! ISR-debounced anchor-arm button.
//!
//! ## Hardware
//!
//! Active-low momentary switch with a pull-up.  The GPIO fires on the
//! falling edge and the ISR calls [`arm_button_isr`] with the monotonic
//! time in milliseconds.
//!
//! ## Split
//!
//! The ISR only debounces and raises an atomic pending flag.  Edges that
//! arrive less than the debounce window after the last accepted one are
//! dropped.  [`ArmButton::forward`], called from a task loop, turns a
//! pending press into [`Event::ArmAnchor`] on the event queue.  Pushing
//! onto the queue wakes the tracker thread, which must never happen in
//! interrupt context.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::{debug, warn};

use crate::events::{Event, EventQueue};

/// Default rejection window for repeat edges.
pub const ARM_DEBOUNCE_MS: u32 = 200;

pub struct ArmButton {
    debounce_ms: AtomicU32,
    /// Timestamp of the last accepted edge (ms since boot, wrapping).
    last_accept_ms: AtomicU32,
    /// No edge accepted yet; the first one always passes.
    idle: AtomicBool,
    /// An accepted press not yet forwarded to the queue.
    pending: AtomicBool,
}

impl ArmButton {
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms: AtomicU32::new(debounce_ms),
            last_accept_ms: AtomicU32::new(0),
            idle: AtomicBool::new(true),
            pending: AtomicBool::new(false),
        }
    }

    /// Change the debounce window.  Call before the ISR is installed.
    pub fn set_debounce_ms(&self, debounce_ms: u32) {
        self.debounce_ms.store(debounce_ms, Ordering::Release);
    }

    pub fn debounce_ms(&self) -> u32 {
        self.debounce_ms.load(Ordering::Acquire)
    }

    /// Feed one falling edge.  Returns `true` if it is accepted.
    pub fn on_edge(&self, now_ms: u32) -> bool {
        if !self.idle.load(Ordering::Acquire) {
            let last = self.last_accept_ms.load(Ordering::Acquire);
            if now_ms.wrapping_sub(last) < self.debounce_ms() {
                return false;
            }
        }
        self.last_accept_ms.store(now_ms, Ordering::Release);
        self.idle.store(false, Ordering::Release);
        true
    }

    /// Interrupt side: debounce and, if accepted, mark a press pending.
    /// Atomics only.
    pub fn latch(&self, now_ms: u32) -> bool {
        if !self.on_edge(now_ms) {
            return false;
        }
        self.pending.store(true, Ordering::Release);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Task side: move a pending press onto `queue`.
    ///
    /// Returns `true` if an arm request was queued.  A full queue keeps
    /// the press pending for the next call.
    pub fn forward(&self, queue: &EventQueue) -> bool {
        if !self.pending.swap(false, Ordering::AcqRel) {
            return false;
        }
        if queue.push(Event::ArmAnchor) {
            debug!("ArmButton: arm request queued");
            true
        } else {
            self.pending.store(true, Ordering::Release);
            warn!("ArmButton: event queue full, press held");
            false
        }
    }
}

/// The board's single arm button.
pub static ARM_BUTTON: ArmButton = ArmButton::new(ARM_DEBOUNCE_MS);

/// ISR handler. Register this on the button GPIO falling edge.
/// Safe in interrupt context: atomic loads and stores only.
pub fn arm_button_isr(now_ms: u32) {
    ARM_BUTTON.latch(now_ms);
}
