//! Duty-cycle and cadence timers.
//!
//! The sensor loop alternates between two windows so the orientation
//! sensor and the environment sensor never run at the same time:
//!
//! ```text
//!   ┌── inactive (5 s) ──┐┌────── active (10 s) ──────┐┌── inactive ...
//!   │ environment @ 1 Hz ││ orientation @ 10 Hz       ││
//!   └────────────────────┘└───────────────────────────┘└──────────
//!                        ▲ Opened                     ▲ Closed
//! ```
//!
//! Both timers are driven by elapsed milliseconds passed in from the
//! caller, so they are independent of any clock source and of the event
//! system.

use log::debug;

use crate::config::SystemConfig;

// ═══════════════════════════════════════════════════════════════
//  Duty cycle
// ═══════════════════════════════════════════════════════════════

/// Edge reported by [`DutyCycle::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEdge {
    /// The active window started.
    Opened,
    /// The active window ended.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Inactive,
    Active,
}

/// Alternating inactive/active window timer.  Starts inactive.
#[derive(Debug, Clone)]
pub struct DutyCycle {
    inactive_ms: u32,
    active_ms: u32,
    phase: Phase,
    elapsed_ms: u32,
}

impl DutyCycle {
    pub fn new(inactive_ms: u32, active_ms: u32) -> Self {
        Self {
            inactive_ms,
            active_ms,
            phase: Phase::Inactive,
            elapsed_ms: 0,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.sampling_window_inactive_ms,
            config.sampling_window_active_ms,
        )
    }

    /// Advance by `elapsed_ms`.  Reports at most one edge per call; any
    /// overshoot carries into the next phase.
    pub fn tick(&mut self, elapsed_ms: u32) -> Option<WindowEdge> {
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);

        let limit = match self.phase {
            Phase::Inactive => self.inactive_ms,
            Phase::Active => self.active_ms,
        };
        if self.elapsed_ms < limit {
            return None;
        }

        self.elapsed_ms -= limit;
        let edge = match self.phase {
            Phase::Inactive => {
                self.phase = Phase::Active;
                WindowEdge::Opened
            }
            Phase::Active => {
                self.phase = Phase::Inactive;
                WindowEdge::Closed
            }
        };
        debug!("Duty cycle: {:?}", edge);
        Some(edge)
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }
}

// ═══════════════════════════════════════════════════════════════
//  Fixed cadence
// ═══════════════════════════════════════════════════════════════

/// Fires once every `period_ms` of accumulated elapsed time.
#[derive(Debug, Clone)]
pub struct Interval {
    period_ms: u32,
    elapsed_ms: u32,
}

impl Interval {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            elapsed_ms: 0,
        }
    }

    /// Returns `true` when a period has completed.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        if self.elapsed_ms < self.period_ms {
            return false;
        }
        self.elapsed_ms %= self.period_ms.max(1);
        true
    }

    /// Start counting a fresh period.
    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
    }
}
