//! Outbound application events and the composed status message.
//!
//! The services emit [`AppEvent`]s through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.  [`StatusMessage`] is the value
//! pushed onto the status queue once per ingested fix.

use crate::error::{ReceiverError, TransitionError};
use crate::fix::{GeofenceAnchor, PositionFix};
use crate::fsm::DeviceState;
use crate::geofence::VisitEvent;
use crate::posture::PostureSnapshot;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The tracker has started (carries initial state).
    Started(DeviceState),

    /// The FSM transitioned between states.
    StateChanged { from: DeviceState, to: DeviceState },

    /// The trough anchor was set.
    AnchorArmed(GeofenceAnchor),

    /// An arm request arrived when it could not be honoured.
    ArmRejected(TransitionError),

    /// A qualifying trough visit ended.
    VisitCompleted {
        visit: VisitEvent,
        total_dwell_ms: u64,
    },

    /// The consecutive invalid-fix threshold was reached.
    SignalLost { invalid_fixes: u8 },

    /// A valid fix arrived after signal loss.
    SignalRestored,

    /// The receiver restart request failed.  Tracking carries on.
    ReceiverRestartFailed(ReceiverError),

    /// The debounced posture changed.
    PostureChanged(PostureSnapshot),

    /// A subsystem failed its startup probe and is disabled.
    SubsystemDisabled(&'static str),

    /// The status queue overflowed and older entries were dropped.
    StatusPurged { dropped: usize },
}

/// One composed status, produced for every ingested fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusMessage {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed_mps: f32,
    pub heading_deg: f32,
    /// Cumulative qualifying trough dwell (s).
    pub total_dwell_secs: f64,
    /// Set on the first status after the anchor was armed.
    pub anchor_just_armed: bool,
    pub state: DeviceState,
    pub posture: PostureSnapshot,
}

impl StatusMessage {
    /// Position fields taken from `fix`, everything else empty.
    pub fn from_fix(fix: &PositionFix, state: DeviceState) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            speed_mps: fix.speed_mps,
            heading_deg: fix.heading_deg,
            total_dwell_secs: 0.0,
            anchor_just_armed: false,
            state,
            posture: PostureSnapshot::EMPTY,
        }
    }
}
