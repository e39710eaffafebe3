//! Tracker service: the hexagonal core.
//!
//! [`TrackerService`] owns the FSM and its context.  It consumes one
//! [`Event`] at a time, drives the state machine, feeds the visit
//! detector, applies indicator and receiver commands through the port
//! traits, and composes the [`StatusMessage`] for every ingested fix.
//!
//! ```text
//!  EventQueue ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                 │     TrackerService      │
//! ReceiverPort ◀──│  FSM · Geofence · Loss  │ ──▶ StatusMessage
//! IndicatorPort ◀─│                         │
//!                 └─────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::TransitionError;
use crate::events::Event;
use crate::fix::{GeofenceAnchor, PositionFix};
use crate::fsm::context::{FsmContext, IndicatorColour, Input};
use crate::fsm::states::build_state_table;
use crate::fsm::{DeviceState, Fsm, Transition};
use crate::geofence::VisitStats;
use crate::sensors::SharedReadings;

use super::events::{AppEvent, StatusMessage};
use super::ports::{EventSink, IndicatorPort, ReceiverPort};

// ───────────────────────────────────────────────────────────────
// TrackerService
// ───────────────────────────────────────────────────────────────

pub struct TrackerService {
    fsm: Fsm,
    ctx: FsmContext,
    /// Colour last written to the indicator, to skip redundant writes.
    applied_indicator: Option<IndicatorColour>,
    fixes_ingested: u64,
}

impl TrackerService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), DeviceState::Searching),
            ctx: FsmContext::new(config),
            applied_indicator: None,
            fixes_ingested: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, hw: &mut impl IndicatorPort, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.apply_indicator(hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("TrackerService started in {:?}", self.fsm.current_state());
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Process one queued event to completion.
    ///
    /// Returns the status composed for a fix event; arm requests
    /// produce no status.
    pub fn handle(
        &mut self,
        event: Event,
        now_ms: u64,
        readings: &SharedReadings,
        hw: &mut (impl ReceiverPort + IndicatorPort),
        sink: &mut impl EventSink,
    ) -> Option<StatusMessage> {
        match event {
            Event::Fix(fix) => Some(self.ingest(fix, now_ms, readings, hw, sink)),
            Event::ArmAnchor => {
                // Rejections are already reported through the sink.
                let _ = self.arm_anchor(hw, sink);
                None
            }
        }
    }

    /// Feed one position fix through the state machine and the visit
    /// detector, then compose the resulting status.
    pub fn ingest(
        &mut self,
        fix: PositionFix,
        now_ms: u64,
        readings: &SharedReadings,
        hw: &mut (impl ReceiverPort + IndicatorPort),
        sink: &mut impl EventSink,
    ) -> StatusMessage {
        self.fixes_ingested += 1;
        self.ctx.load(Input::Fix(fix));

        if let Some(t) = self.fsm.step(&mut self.ctx) {
            self.report_transition(t, sink);
        }

        if self.ctx.commands.restart_receiver {
            self.ctx.commands.restart_receiver = false;
            if let Err(e) = hw.restart_receiver() {
                warn!("Receiver restart failed: {}", e);
                sink.emit(&AppEvent::ReceiverRestartFailed(e));
            }
        }

        if fix.valid && self.fsm.current_state() == DeviceState::Tracking {
            if let Some(anchor) = self.ctx.anchor {
                if let Some(visit) = self.ctx.visits.update(&anchor, &fix, now_ms) {
                    sink.emit(&AppEvent::VisitCompleted {
                        visit,
                        total_dwell_ms: self.ctx.visits.stats().total_dwell_ms,
                    });
                }
            }
        }

        self.apply_indicator(hw);
        self.compose_status(readings)
    }

    /// Set the trough anchor from the latest fix.
    ///
    /// Only accepted in `WaitingForAnchor` with a valid fix.  A rejected
    /// request leaves every piece of state untouched and is reported as
    /// [`AppEvent::ArmRejected`].
    pub fn arm_anchor(
        &mut self,
        hw: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) -> Result<(), TransitionError> {
        self.ctx.load(Input::ArmAnchor);
        let transition = self.fsm.step(&mut self.ctx);

        if let Some(rejection) = self.ctx.rejection {
            sink.emit(&AppEvent::ArmRejected(rejection));
            return Err(rejection);
        }

        if let Some(t) = transition {
            self.report_transition(t, sink);
        }
        if let Some(anchor) = self.ctx.anchor {
            sink.emit(&AppEvent::AnchorArmed(anchor));
        }
        self.apply_indicator(hw);
        Ok(())
    }

    /// Build a status from the latest fix, the visit totals and one
    /// consistent read of the shared sensor snapshot.  Consumes the
    /// pending "anchor just armed" notice.
    pub fn compose_status(&mut self, readings: &SharedReadings) -> StatusMessage {
        let snapshot = readings.snapshot();
        let mut status = StatusMessage::from_fix(&self.ctx.latest_fix, self.fsm.current_state());
        status.total_dwell_secs = self.ctx.visits.stats().total_secs();
        status.anchor_just_armed = core::mem::take(&mut self.ctx.anchor_notice_pending);
        status.posture = snapshot.posture;
        status
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> DeviceState {
        self.fsm.current_state()
    }

    pub fn invalid_fix_count(&self) -> u8 {
        self.ctx.invalid_fix_count
    }

    pub fn latest_fix(&self) -> &PositionFix {
        &self.ctx.latest_fix
    }

    pub fn anchor(&self) -> Option<&GeofenceAnchor> {
        self.ctx.anchor.as_ref()
    }

    pub fn visit_stats(&self) -> VisitStats {
        self.ctx.visits.stats()
    }

    pub fn in_zone(&self) -> bool {
        self.ctx.visits.in_zone()
    }

    pub fn signal_lost(&self) -> bool {
        self.ctx.signal_lost
    }

    pub fn awaiting_anchor(&self) -> bool {
        self.ctx.awaiting_anchor
    }

    pub fn anchor_notice_pending(&self) -> bool {
        self.ctx.anchor_notice_pending
    }

    pub fn indicator(&self) -> IndicatorColour {
        self.ctx.commands.indicator
    }

    /// Fix events processed since startup.
    pub fn fixes_ingested(&self) -> u64 {
        self.fixes_ingested
    }

    // ── Internal ──────────────────────────────────────────────

    fn report_transition(&self, t: Transition, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::StateChanged {
            from: t.from,
            to: t.to,
        });
        match (t.from, t.to) {
            (_, DeviceState::SignalLost) => sink.emit(&AppEvent::SignalLost {
                invalid_fixes: self.ctx.invalid_fix_count,
            }),
            (DeviceState::SignalLost, _) => sink.emit(&AppEvent::SignalRestored),
            _ => {}
        }
    }

    fn apply_indicator(&mut self, hw: &mut impl IndicatorPort) {
        let colour = self.ctx.commands.indicator;
        if self.applied_indicator != Some(colour) {
            hw.set_indicator(colour);
            self.applied_indicator = Some(colour);
        }
    }
}
