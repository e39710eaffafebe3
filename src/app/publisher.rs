//! Periodic telemetry publisher.
//!
//! Every publish interval the status queue is drained down to its newest
//! entry, merged with the latest environment reading and handed to the
//! [`PublishPort`] as a JSON [`TelemetryPayload`].  A failed publish is
//! logged and retried with fresh data at the next interval.

use heapless::String;
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::payload::TelemetryPayload;
use crate::scheduler::Interval;
use crate::sensors::SharedReadings;

use super::events::StatusMessage;
use super::ports::PublishPort;
use super::status_queue::StatusQueue;

/// Uplink topic for telemetry payloads.
pub const TELEMETRY_TOPIC: &str = "horse_data";

pub struct TelemetryPublisher {
    cadence: Interval,
    topic: String<32>,
    /// Newest status with a non-zero position seen so far.
    last_status: Option<StatusMessage>,
    published: u32,
    failures: u32,
}

impl TelemetryPublisher {
    pub fn new(config: &SystemConfig) -> Self {
        let mut topic = String::new();
        // Fits: the topic constant is shorter than the buffer.
        let _ = topic.push_str(TELEMETRY_TOPIC);
        Self {
            cadence: Interval::new(config.publish_interval_secs.saturating_mul(1000)),
            topic,
            last_status: None,
            published: 0,
            failures: 0,
        }
    }

    /// Advance by `elapsed_ms`; publishes once per interval.
    ///
    /// Returns `Some(result)` when an interval elapsed.
    pub fn tick<const N: usize>(
        &mut self,
        elapsed_ms: u32,
        queue: &StatusQueue<N>,
        readings: &SharedReadings,
        port: &mut impl PublishPort,
    ) -> Option<Result<(), CommsError>> {
        if !self.cadence.tick(elapsed_ms) {
            return None;
        }
        Some(self.publish_now(queue, readings, port))
    }

    /// Drain, compose, encode and publish immediately.
    pub fn publish_now<const N: usize>(
        &mut self,
        queue: &StatusQueue<N>,
        readings: &SharedReadings,
        port: &mut impl PublishPort,
    ) -> Result<(), CommsError> {
        let mut water_flag = false;
        if let Some((latest, anchor_seen)) = queue.take_latest() {
            water_flag = anchor_seen;
            // A zero position is the receiver's "nothing yet"; keep the
            // previous coordinates rather than publishing the origin.
            if latest.latitude != 0.0 || latest.longitude != 0.0 {
                self.last_status = Some(latest);
            } else {
                debug!("Publisher: newest status has no position, keeping previous");
            }
        }

        let environment = readings.snapshot().environment;
        let payload =
            TelemetryPayload::compose(self.last_status.as_ref(), water_flag, environment.as_ref());
        let json = payload.to_json()?;

        match port.publish(&self.topic, &json) {
            Ok(()) => {
                self.published = self.published.saturating_add(1);
                info!("Publisher: {} bytes to {}", json.len(), self.topic);
                Ok(())
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                warn!("Publisher: publish to {} failed: {}", self.topic, e);
                Err(e)
            }
        }
    }

    pub fn last_status(&self) -> Option<&StatusMessage> {
        self.last_status.as_ref()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn published(&self) -> u32 {
        self.published
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}
