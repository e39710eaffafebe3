//! Log-based adapters.
//!
//! [`LogEventSink`] implements [`EventSink`] by writing structured
//! application events to the logger (UART / USB-CDC in production).
//! [`LogPublisher`] implements [`PublishPort`] the same way, standing in
//! for the cellular uplink on the bench.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, PublishPort};
use crate::error::CommsError;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink {
    utc_offset_hours: i8,
}

impl LogEventSink {
    pub fn new(utc_offset_hours: i8) -> Self {
        Self { utc_offset_hours }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::AnchorArmed(anchor) => {
                info!(
                    "ANCHOR | ({:.6}, {:.6}, alt={:.1}) acc={:.1}m",
                    anchor.latitude, anchor.longitude, anchor.altitude, anchor.accuracy_m
                );
            }
            AppEvent::ArmRejected(reason) => {
                warn!("ANCHOR | arm rejected: {}", reason);
            }
            AppEvent::VisitCompleted {
                visit,
                total_dwell_ms,
            } => {
                let t = &visit.entry_fix.timestamp;
                info!(
                    "VISIT | start {:02}:{:02}:{:02} local | dwell={}.{:03}s | total={}s",
                    t.local_hour(self.utc_offset_hours),
                    t.minute,
                    t.second,
                    visit.dwell_ms / 1000,
                    visit.dwell_ms % 1000,
                    total_dwell_ms / 1000,
                );
            }
            AppEvent::SignalLost { invalid_fixes } => {
                warn!("SIGNAL | lost after {} invalid fixes", invalid_fixes);
            }
            AppEvent::SignalRestored => {
                info!("SIGNAL | restored");
            }
            AppEvent::ReceiverRestartFailed(e) => {
                warn!("SIGNAL | receiver restart failed: {}", e);
            }
            AppEvent::PostureChanged(p) => {
                info!(
                    "POSTURE | {:?} | roll={:.2} pitch={:.2}",
                    p.state, p.roll_deg, p.pitch_deg
                );
            }
            AppEvent::SubsystemDisabled(name) => {
                warn!("SUBSYS | {} disabled", name);
            }
            AppEvent::StatusPurged { dropped } => {
                info!("QUEUE | full, purged {} stale statuses", dropped);
            }
        }
    }
}

/// Uplink stand-in that logs the encoded payload.
#[derive(Default)]
pub struct LogPublisher {
    sent: u32,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }
}

impl PublishPort for LogPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let text = core::str::from_utf8(payload).map_err(|_| CommsError::EncodeFailed)?;
        info!("PUBLISH | {} | {}", topic, text);
        self.sent = self.sent.saturating_add(1);
        Ok(())
    }
}
