//! Function-pointer finite state machine engine for the position-fix
//! lifecycle.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                        │
//! │  ┌──────────────────┬───────────┬──────────┬────────────────────┐  │
//! │  │ DeviceState      │ on_enter  │ on_exit  │ on_update          │  │
//! │  ├──────────────────┼───────────┼──────────┼────────────────────┤  │
//! │  │ Searching        │ fn(ctx)   │ -        │ fn(ctx)->Option<>  │  │
//! │  │ WaitingForAnchor │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<>  │  │
//! │  │ Tracking         │ fn(ctx)   │ -        │ fn(ctx)->Option<>  │  │
//! │  │ SignalLost       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<>  │  │
//! │  └──────────────────┴───────────┴──────────┴────────────────────┘  │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each consumed event the engine calls `on_update` for the **current**
//! state with the event stored in [`FsmContext::input`].  If it returns
//! `Some(next)` and the edge is legal, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next.  Edges outside
//! [`DeviceState::can_transition_to`] are refused and logged.

pub mod context;
pub mod states;

use context::FsmContext;
use log::{error, info};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Lifecycle of the tracker.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum DeviceState {
    /// No valid fix seen since boot.
    Searching = 0,
    /// Position known, waiting for the user to arm the trough anchor.
    WaitingForAnchor = 1,
    /// Anchor set, visit detection running.
    Tracking = 2,
    /// Too many consecutive invalid fixes while tracking.
    SignalLost = 3,
}

impl DeviceState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `DeviceState`.  Panics on out-of-range in
    /// debug builds; returns `Searching` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Searching,
            1 => Self::WaitingForAnchor,
            2 => Self::Tracking,
            3 => Self::SignalLost,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Searching
            }
        }
    }

    /// The only edges the tracker may take.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Searching, Self::WaitingForAnchor)
                | (Self::WaitingForAnchor, Self::Tracking)
                | (Self::Tracking, Self::SignalLost)
                | (Self::SignalLost, Self::Tracking)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Searching => "Searching",
            Self::WaitingForAnchor => "WaitingForAnchor",
            Self::Tracking => "Tracking",
            Self::SignalLost => "SignalLost",
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-event update handler.
/// Returns `Some(next)` to request a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<DeviceState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array, no heap and no `dyn`.
pub struct StateDescriptor {
    pub id: DeviceState,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// A transition the engine actually performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DeviceState,
    pub to: DeviceState,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]).  The mutable
/// [`FsmContext`] is owned by the caller and threaded through every
/// handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `DeviceState as usize`.
    table: [StateDescriptor; DeviceState::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Events processed since start.
    step_count: u64,
    /// Step at which the current state was entered.
    state_entry_step: u64,
    /// Transitions requested by a handler but refused by the edge check.
    refused: u32,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; DeviceState::COUNT], initial: DeviceState) -> Self {
        Self {
            table,
            current: initial as usize,
            step_count: 0,
            state_entry_step: 0,
            refused: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `step()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.current_state().name());
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Process the event currently held in `ctx.input`.
    ///
    /// Returns the transition taken, if any.
    pub fn step(&mut self, ctx: &mut FsmContext) -> Option<Transition> {
        self.step_count += 1;

        let from = self.current_state();
        let next = (self.table[self.current].on_update)(ctx)?;

        if !from.can_transition_to(next) {
            self.refused = self.refused.saturating_add(1);
            error!("FSM refused illegal transition {} -> {}", from.name(), next.name());
            debug_assert!(false, "illegal transition {from:?} -> {next:?}");
            return None;
        }

        self.transition(next, ctx);
        Some(Transition { from, to: next })
    }

    /// The current state's identity.
    pub fn current_state(&self) -> DeviceState {
        self.table[self.current].id
    }

    /// How many events the FSM has processed in the current state.
    pub fn steps_in_current_state(&self) -> u64 {
        self.step_count - self.state_entry_step
    }

    /// Illegal transitions refused since start.
    pub fn refused_transitions(&self) -> u32 {
        self.refused
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: DeviceState, ctx: &mut FsmContext) {
        let next_idx = next as usize;

        info!(
            "FSM transition: {} -> {}",
            self.current_state().name(),
            next.name()
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_step = self.step_count;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
