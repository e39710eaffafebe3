//! Inbound event queue.
//!
//! Events are produced by the input loop, which forwards:
//! - fixes staged by the receiver's PVT callback ([`Event::Fix`])
//! - presses latched by the arm button ISR ([`Event::ArmAnchor`])
//!
//! and consumed by the tracker loop, one at a time, to completion.
//!
//! ```text
//! ┌──────────────┐ stage ┌────────────┐     ┌────────────┐     ┌──────────────┐
//! │ PVT callback │──────▶│            │     │            │     │              │
//! │              │       │ Input loop │────▶│ EventQueue │────▶│ Tracker loop │
//! │ Button ISR   │──────▶│            │     │ (bounded)  │     │  (consumer)  │
//! └──────────────┘ latch └────────────┘     └────────────┘     └──────────────┘
//! ```
//!
//! A push wakes a consumer parked in [`EventQueue::wait_blocking`], so
//! pushes belong in task context only.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;

use crate::fix::PositionFix;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A solution (valid or not) from the position receiver.
    Fix(PositionFix),
    /// The user pressed the arm button at the trough.
    ArmAnchor,
}

/// Bounded MPSC queue between task-context producers and the tracker.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_CAP>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Push an event without blocking.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        self.channel.try_send(event).is_ok()
    }

    /// Pop the next event, or `None` if the queue is empty.
    pub fn pop(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next event.
    pub async fn wait(&self) -> Event {
        self.channel.receive().await
    }

    /// Block the calling thread until an event arrives.  No timeout.
    pub fn wait_blocking(&self) -> Event {
        future::block_on(self.wait())
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The device-wide queue between the input loop and the tracker loop.
pub static EVENTS: EventQueue = EventQueue::new();
