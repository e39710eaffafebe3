//! Position-receiver adapter.
//!
//! The modem glue that owns the receiver lives outside this crate.  It
//! meets the tracker here in two places:
//!
//! - every PVT solution is handed to [`ReceiverLink::on_pvt`], which
//!   stages it in a lock-free ring.  A task loop calls
//!   [`ReceiverLink::forward`] to move staged fixes onto the event queue
//!   as [`Event::Fix`];
//! - restart requests from the tracker are latched in an atomic flag and
//!   picked up by the glue with [`ReceiverLink::take_restart_request`].
//!   Until the glue takes the latch, further restart requests fail with
//!   [`ReceiverError::RestartPending`].
//!
//! `on_pvt` never touches the event queue or the logger, so it can run
//! in the receiver's callback context.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use heapless::mpmc::MpMcQueue;
use log::{debug, warn};

use crate::app::ports::ReceiverPort;
use crate::error::ReceiverError;
use crate::events::{Event, EventQueue};
use crate::fix::PositionFix;

/// Fixes held between the PVT callback and the forwarding loop.
/// Power of two, required by the ring.
pub const PVT_STAGING_DEPTH: usize = 8;

pub struct ReceiverLink {
    staged: MpMcQueue<PositionFix, PVT_STAGING_DEPTH>,
    restart_latched: AtomicBool,
    /// Set when a restart request found the previous one still latched.
    unserviced_reported: AtomicBool,
    dropped_fixes: AtomicU32,
}

impl ReceiverLink {
    pub const fn new() -> Self {
        Self {
            staged: MpMcQueue::new(),
            restart_latched: AtomicBool::new(false),
            unserviced_reported: AtomicBool::new(false),
            dropped_fixes: AtomicU32::new(0),
        }
    }

    /// Stage one solution from the receiver.  A full ring drops it.
    pub fn on_pvt(&self, fix: PositionFix) {
        if self.staged.enqueue(fix).is_err() {
            self.dropped_fixes.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Move staged fixes onto `queue` in arrival order.  Returns how many
    /// were queued.  Fixes the queue cannot take are dropped and counted.
    pub fn forward(&self, queue: &EventQueue) -> usize {
        let mut queued = 0;
        while let Some(fix) = self.staged.dequeue() {
            if queue.push(Event::Fix(fix)) {
                queued += 1;
            } else {
                self.dropped_fixes.fetch_add(1, Ordering::Relaxed);
                warn!("ReceiverLink: event queue full, fix dropped");
            }
        }
        queued
    }

    /// Called by the modem glue.  Returns `true` once per latched restart.
    pub fn take_restart_request(&self) -> bool {
        let taken = self.restart_latched.swap(false, Ordering::AcqRel);
        if taken {
            self.unserviced_reported.store(false, Ordering::Release);
        }
        taken
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_latched.load(Ordering::Acquire)
    }

    pub fn dropped_fixes(&self) -> u32 {
        self.dropped_fixes.load(Ordering::Relaxed)
    }
}

impl Default for ReceiverLink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiverPort for &ReceiverLink {
    fn restart_receiver(&mut self) -> Result<(), ReceiverError> {
        if self.restart_latched.swap(true, Ordering::AcqRel) {
            if !self.unserviced_reported.swap(true, Ordering::AcqRel) {
                warn!("ReceiverLink: previous restart never taken by the modem glue");
            }
            return Err(ReceiverError::RestartPending);
        }
        debug!("ReceiverLink: restart latched");
        Ok(())
    }
}

/// The device's single receiver link.
pub static RECEIVER: ReceiverLink = ReceiverLink::new();
