//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the event being processed, the latest fix, the anchor, the
//! signal-loss counter, the visit detector and the commands the service
//! applies to hardware afterwards.

use crate::config::SystemConfig;
use crate::error::TransitionError;
use crate::fix::{GeofenceAnchor, PositionFix};
use crate::geofence::VisitDetector;

// ---------------------------------------------------------------------------
// Input (written by the service before each step)
// ---------------------------------------------------------------------------

/// The event a step is processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Fix(PositionFix),
    ArmAnchor,
}

// ---------------------------------------------------------------------------
// Commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Status indicator colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IndicatorColour {
    #[default]
    Off,
    /// Searching for a fix, or signal lost.
    Red,
    /// Waiting for the anchor to be armed.
    Yellow,
    /// Tracking.
    Green,
}

/// Commands that handlers write to request hardware actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commands {
    pub indicator: IndicatorColour,
    /// One-shot: the service clears it after issuing the restart.
    pub restart_receiver: bool,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Event --
    /// Event under processing.  `None` before the first [`load`](Self::load).
    pub input: Option<Input>,

    // -- Position --
    /// Most recent fix; only overwritten by valid fixes.
    pub latest_fix: PositionFix,
    /// Trough location, set once by the arm action.
    pub anchor: Option<GeofenceAnchor>,
    pub visits: VisitDetector,

    // -- Signal loss --
    /// Consecutive invalid fixes while tracking.
    pub invalid_fix_count: u8,
    pub signal_lost: bool,

    // -- Anchor arming --
    pub awaiting_anchor: bool,
    /// Consumed by the next composed status.
    pub anchor_notice_pending: bool,
    /// Set when the current event was a rejected command.
    pub rejection: Option<TransitionError>,

    // -- Outputs --
    pub commands: Commands,

    // -- Configuration --
    pub config: SystemConfig,
}

impl FsmContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            input: None,
            latest_fix: PositionFix::invalid(),
            anchor: None,
            visits: VisitDetector::from_config(&config),
            invalid_fix_count: 0,
            signal_lost: false,
            awaiting_anchor: false,
            anchor_notice_pending: false,
            rejection: None,
            commands: Commands::default(),
            config,
        }
    }

    /// Prepare the context for the next step.
    ///
    /// A valid fix resets the invalid-fix counter and replaces the latest
    /// fix in every state; invalid fixes leave both alone here and are
    /// counted by the tracking handler.
    pub fn load(&mut self, input: Input) {
        self.rejection = None;
        if let Input::Fix(fix) = input {
            self.absorb_fix(&fix);
        }
        self.input = Some(input);
    }

    fn absorb_fix(&mut self, fix: &PositionFix) {
        if fix.valid {
            self.invalid_fix_count = 0;
            self.latest_fix = *fix;
        }
    }

    /// The fix under processing, if the current event is one.
    pub fn current_fix(&self) -> Option<&PositionFix> {
        match &self.input {
            Some(Input::Fix(fix)) => Some(fix),
            _ => None,
        }
    }

    pub fn is_arm_request(&self) -> bool {
        matches!(self.input, Some(Input::ArmAnchor))
    }
}
