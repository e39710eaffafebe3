//! Concrete state handler functions and table builder.
//!
//! ```text
//!  SEARCHING ──[valid fix]──▶ WAITING_FOR_ANCHOR ──[arm]──▶ TRACKING
//!                                                            │   ▲
//!                                       [10 invalid in a row]│   │[valid fix]
//!                                                            ▼   │
//!                                                         SIGNAL_LOST
//! ```
//!
//! Arm requests outside `WaitingForAnchor` are rejected without touching
//! state; the rejection is left in [`FsmContext::rejection`].

use super::{DeviceState, StateDescriptor};
use super::context::{FsmContext, IndicatorColour};
use crate::error::TransitionError;
use crate::fix::GeofenceAnchor;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; DeviceState::COUNT] {
    [
        // Index 0: Searching
        StateDescriptor {
            id: DeviceState::Searching,
            on_enter: Some(searching_enter),
            on_exit: None,
            on_update: searching_update,
        },
        // Index 1: WaitingForAnchor
        StateDescriptor {
            id: DeviceState::WaitingForAnchor,
            on_enter: Some(waiting_enter),
            on_exit: Some(waiting_exit),
            on_update: waiting_update,
        },
        // Index 2: Tracking
        StateDescriptor {
            id: DeviceState::Tracking,
            on_enter: Some(tracking_enter),
            on_exit: None,
            on_update: tracking_update,
        },
        // Index 3: SignalLost
        StateDescriptor {
            id: DeviceState::SignalLost,
            on_enter: Some(signal_lost_enter),
            on_exit: Some(signal_lost_exit),
            on_update: signal_lost_update,
        },
    ]
}

/// Record a rejected arm request for the current state.
fn reject_arm(ctx: &mut FsmContext, state: DeviceState) {
    warn!("Arm request ignored in state {}", state.name());
    ctx.rejection = Some(TransitionError::NotAwaitingAnchor(state));
}

// ═══════════════════════════════════════════════════════════════════════════
//  SEARCHING state
// ═══════════════════════════════════════════════════════════════════════════

fn searching_enter(ctx: &mut FsmContext) {
    ctx.commands.indicator = IndicatorColour::Red;
    info!("SEARCHING: waiting for first valid fix");
}

fn searching_update(ctx: &mut FsmContext) -> Option<DeviceState> {
    if ctx.is_arm_request() {
        reject_arm(ctx, DeviceState::Searching);
        return None;
    }

    match ctx.current_fix() {
        Some(fix) if fix.valid => Some(DeviceState::WaitingForAnchor),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAITING_FOR_ANCHOR state: position known, trough not yet marked
// ═══════════════════════════════════════════════════════════════════════════

fn waiting_enter(ctx: &mut FsmContext) {
    ctx.awaiting_anchor = true;
    ctx.commands.indicator = IndicatorColour::Yellow;
    info!(
        "WAITING_FOR_ANCHOR: fix at {:.6}, {:.6}, press button at the trough",
        ctx.latest_fix.latitude, ctx.latest_fix.longitude
    );
}

fn waiting_exit(ctx: &mut FsmContext) {
    ctx.awaiting_anchor = false;
}

fn waiting_update(ctx: &mut FsmContext) -> Option<DeviceState> {
    if !ctx.is_arm_request() {
        return None;
    }

    let Some(anchor) = GeofenceAnchor::from_fix(&ctx.latest_fix) else {
        warn!("WAITING_FOR_ANCHOR: arm request without a valid fix");
        ctx.rejection = Some(TransitionError::NoValidFix);
        return None;
    };

    info!(
        "WAITING_FOR_ANCHOR: anchor set at {:.6}, {:.6} (±{:.1} m)",
        anchor.latitude, anchor.longitude, anchor.accuracy_m
    );
    ctx.anchor = Some(anchor);
    ctx.anchor_notice_pending = true;
    Some(DeviceState::Tracking)
}

// ═══════════════════════════════════════════════════════════════════════════
//  TRACKING state: anchor set, visits counted
// ═══════════════════════════════════════════════════════════════════════════

fn tracking_enter(ctx: &mut FsmContext) {
    ctx.signal_lost = false;
    ctx.commands.indicator = IndicatorColour::Green;
    info!("TRACKING: geofence radius {:.1} m", ctx.config.trough_radius_m);
}

fn tracking_update(ctx: &mut FsmContext) -> Option<DeviceState> {
    if ctx.is_arm_request() {
        reject_arm(ctx, DeviceState::Tracking);
        return None;
    }

    let fix = ctx.current_fix()?;
    if fix.valid {
        return None;
    }

    ctx.invalid_fix_count = ctx.invalid_fix_count.saturating_add(1);
    if ctx.invalid_fix_count >= ctx.config.no_fix_threshold {
        warn!(
            "TRACKING: {} consecutive invalid fixes, signal lost",
            ctx.invalid_fix_count
        );
        return Some(DeviceState::SignalLost);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SIGNAL_LOST state: waiting for the receiver to come back
// ═══════════════════════════════════════════════════════════════════════════

fn signal_lost_enter(ctx: &mut FsmContext) {
    ctx.signal_lost = true;
    ctx.commands.restart_receiver = true;
    ctx.commands.indicator = IndicatorColour::Red;
    warn!("SIGNAL_LOST: requesting receiver restart");
}

fn signal_lost_exit(ctx: &mut FsmContext) {
    ctx.signal_lost = false;
    info!("SIGNAL_LOST: fix restored");
}

fn signal_lost_update(ctx: &mut FsmContext) -> Option<DeviceState> {
    if ctx.is_arm_request() {
        reject_arm(ctx, DeviceState::SignalLost);
        return None;
    }

    match ctx.current_fix() {
        Some(fix) if fix.valid => Some(DeviceState::Tracking),
        _ => None,
    }
}
