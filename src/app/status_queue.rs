//! Bounded outbound status queue.
//!
//! The tracker loop pushes one [`StatusMessage`] per fix; the publisher
//! drains it every interval.  When the queue is full every queued entry
//! is purged and the newest status takes their place, so the publisher
//! always sees the freshest position after an uplink outage.  A purged
//! anchor notice is carried over onto the status that replaces it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::events::{AppEvent, StatusMessage};
use super::ports::EventSink;

/// Default queue depth.
pub const STATUS_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The queue was full; `dropped` older entries were discarded.
    Purged { dropped: usize },
}

pub struct StatusQueue<const N: usize = STATUS_QUEUE_DEPTH> {
    channel: Channel<CriticalSectionRawMutex, StatusMessage, N>,
}

impl<const N: usize> StatusQueue<N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue `status`, purging everything already queued if full.
    pub fn push_latest(&self, status: StatusMessage) -> PushOutcome {
        if self.channel.try_send(status).is_ok() {
            return PushOutcome::Queued;
        }

        let mut status = status;
        let mut dropped = 0;
        while let Ok(old) = self.channel.try_receive() {
            // The anchor notice outlives the entry that carried it.
            status.anchor_just_armed |= old.anchor_just_armed;
            dropped += 1;
        }
        warn!("Status queue full, purged {} entries", dropped);
        if self.channel.try_send(status).is_err() {
            // Only reachable if a producer refilled the queue between the
            // purge and the send; the newest entry is then one of theirs.
            warn!("Status queue refilled during purge, status dropped");
        }
        PushOutcome::Purged { dropped }
    }

    /// [`push_latest`](Self::push_latest), reporting a purge through `sink`.
    pub fn push_reporting(&self, status: StatusMessage, sink: &mut impl EventSink) -> PushOutcome {
        let outcome = self.push_latest(status);
        if let PushOutcome::Purged { dropped } = outcome {
            sink.emit(&AppEvent::StatusPurged { dropped });
        }
        outcome
    }

    pub fn try_take(&self) -> Option<StatusMessage> {
        self.channel.try_receive().ok()
    }

    /// Drain the queue and return only the newest entry, plus whether
    /// any drained entry carried the anchor notice.
    pub fn take_latest(&self) -> Option<(StatusMessage, bool)> {
        let mut latest = self.try_take()?;
        let mut anchor_seen = latest.anchor_just_armed;
        while let Some(next) = self.try_take() {
            anchor_seen |= next.anchor_just_armed;
            latest = next;
        }
        Some((latest, anchor_seen))
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for StatusQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The device-wide status queue between the tracker loop and the
/// publisher.
pub static STATUS_QUEUE: StatusQueue = StatusQueue::new();
