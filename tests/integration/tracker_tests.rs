//! Integration tests for the EventQueue → TrackerService → StatusQueue
//! pipeline.
//!
//! Events go through a real queue and are consumed one at a time, the
//! way the tracker thread does it on the device.

use super::mock_hw::{HwCall, MockHardware, RecordingSink, fix_north};

use herdtag::app::events::{AppEvent, StatusMessage};
use herdtag::app::service::TrackerService;
use herdtag::app::status_queue::StatusQueue;
use herdtag::config::SystemConfig;
use herdtag::error::TransitionError;
use herdtag::events::{Event, EventQueue};
use herdtag::fix::PositionFix;
use herdtag::fsm::DeviceState;
use herdtag::fsm::context::IndicatorColour;
use herdtag::sensors::SharedReadings;

struct Rig {
    tracker: TrackerService,
    events: EventQueue,
    statuses: StatusQueue,
    readings: SharedReadings,
    hw: MockHardware,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let mut rig = Self {
            tracker: TrackerService::new(SystemConfig::default()),
            events: EventQueue::new(),
            statuses: StatusQueue::new(),
            readings: SharedReadings::new(),
            hw: MockHardware::new(),
            sink: RecordingSink::new(),
        };
        rig.tracker.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    /// Queue one event and consume everything pending at `now_ms`.
    fn feed(&mut self, event: Event, now_ms: u64) {
        assert!(self.events.push(event));
        while let Some(ev) = self.events.pop() {
            if let Some(status) =
                self.tracker
                    .handle(ev, now_ms, &self.readings, &mut self.hw, &mut self.sink)
            {
                self.statuses.push_reporting(status, &mut self.sink);
            }
        }
    }

    fn fix(&mut self, fix: PositionFix, now_ms: u64) {
        self.feed(Event::Fix(fix), now_ms);
    }

    fn arm(&mut self, now_ms: u64) {
        self.feed(Event::ArmAnchor, now_ms);
    }

    /// Searching → WaitingForAnchor → Tracking with the anchor at the
    /// test origin.
    fn armed() -> Self {
        let mut rig = Self::new();
        rig.fix(fix_north(0.0), 0);
        rig.arm(0);
        assert_eq!(rig.tracker.state(), DeviceState::Tracking);
        rig
    }

    fn drain(&mut self) -> Vec<StatusMessage> {
        let mut out = Vec::new();
        while let Some(s) = self.statuses.try_take() {
            out.push(s);
        }
        out
    }
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn full_lifecycle_drives_indicator() {
    let mut rig = Rig::new();
    rig.fix(PositionFix::invalid(), 0);
    assert_eq!(rig.tracker.state(), DeviceState::Searching);

    rig.fix(fix_north(0.0), 1000);
    assert_eq!(rig.tracker.state(), DeviceState::WaitingForAnchor);
    assert!(rig.tracker.awaiting_anchor());

    rig.arm(1500);
    assert_eq!(rig.tracker.state(), DeviceState::Tracking);
    assert!(rig.tracker.anchor().is_some());
    assert!(!rig.tracker.awaiting_anchor());

    let colours: Vec<_> = rig
        .hw
        .calls
        .iter()
        .filter_map(|c| match c {
            HwCall::Indicator(colour) => Some(*colour),
            HwCall::RestartReceiver => None,
        })
        .collect();
    assert_eq!(
        colours,
        vec![
            IndicatorColour::Red,
            IndicatorColour::Yellow,
            IndicatorColour::Green
        ]
    );
}

#[test]
fn only_fix_events_produce_statuses() {
    let mut rig = Rig::new();
    rig.fix(PositionFix::invalid(), 0);
    rig.fix(fix_north(0.0), 1000);
    rig.arm(1000);
    rig.fix(fix_north(1.0), 2000);

    let statuses = rig.drain();
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0].state, DeviceState::Searching);
    assert_eq!(statuses[1].state, DeviceState::WaitingForAnchor);
    assert_eq!(statuses[2].state, DeviceState::Tracking);
    assert!(statuses[2].anchor_just_armed);
}

#[test]
fn invalid_fix_does_not_overwrite_last_position() {
    let mut rig = Rig::armed();
    rig.fix(fix_north(3.0), 1000);
    rig.fix(PositionFix::invalid(), 2000);

    let last = rig.drain().pop().unwrap();
    assert!(last.latitude > 40.0);
    assert!(rig.tracker.latest_fix().valid);
}

// ── Arm rejections ────────────────────────────────────────────

#[test]
fn arm_while_searching_is_rejected_without_mutation() {
    let mut rig = Rig::new();
    rig.arm(0);

    assert_eq!(rig.tracker.state(), DeviceState::Searching);
    assert!(rig.tracker.anchor().is_none());
    assert!(rig.sink.events.contains(&AppEvent::ArmRejected(
        TransitionError::NotAwaitingAnchor(DeviceState::Searching)
    )));
    assert!(rig.statuses.is_empty());
}

#[test]
fn rearm_while_tracking_keeps_original_anchor() {
    let mut rig = Rig::armed();
    let anchor = *rig.tracker.anchor().unwrap();

    rig.fix(fix_north(100.0), 1000);
    rig.arm(1000);

    assert_eq!(rig.tracker.anchor(), Some(&anchor));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ArmRejected(_))),
        1
    );
}

// ── Geofence ──────────────────────────────────────────────────

#[test]
fn four_second_visit_is_recorded() {
    let mut rig = Rig::armed();
    for t in [1000, 2000, 3000, 4000] {
        rig.fix(fix_north(5.0), t);
        assert!(rig.tracker.in_zone());
    }
    rig.fix(fix_north(50.0), 5000);

    let visits: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::VisitCompleted { visit, .. } => Some(*visit),
            _ => None,
        })
        .collect();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].dwell_ms, 4000);
    assert_eq!(rig.tracker.visit_stats().total_dwell_ms, 4000);

    let last = rig.drain().pop().unwrap();
    assert!((last.total_dwell_secs - 4.0).abs() < 1e-9);
}

#[test]
fn short_visit_is_discarded() {
    let mut rig = Rig::armed();
    rig.fix(fix_north(2.0), 1000);
    rig.fix(fix_north(40.0), 3999);

    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::VisitCompleted { .. })),
        0
    );
    assert_eq!(rig.tracker.visit_stats().total_dwell_ms, 0);
}

#[test]
fn visit_window_survives_signal_loss() {
    let mut rig = Rig::armed();
    rig.fix(fix_north(1.0), 1000);
    for i in 0..10 {
        rig.fix(PositionFix::invalid(), 1100 + i * 100);
    }
    assert_eq!(rig.tracker.state(), DeviceState::SignalLost);
    assert!(rig.tracker.in_zone());

    rig.fix(fix_north(1.0), 6000);
    assert_eq!(rig.tracker.state(), DeviceState::Tracking);
    rig.fix(fix_north(30.0), 9000);

    assert_eq!(rig.tracker.visit_stats().total_dwell_ms, 8000);
}

// ── Signal loss ───────────────────────────────────────────────

#[test]
fn nine_invalid_then_valid_stays_tracking() {
    let mut rig = Rig::armed();
    for i in 0..9 {
        rig.fix(PositionFix::invalid(), 1000 + i * 1000);
        assert_eq!(rig.tracker.state(), DeviceState::Tracking);
    }
    assert_eq!(rig.tracker.invalid_fix_count(), 9);

    rig.fix(fix_north(0.0), 10_000);
    assert_eq!(rig.tracker.state(), DeviceState::Tracking);
    assert_eq!(rig.tracker.invalid_fix_count(), 0);
    assert_eq!(rig.hw.restarts(), 0);
}

#[test]
fn ten_invalid_then_valid_loses_and_recovers() {
    let mut rig = Rig::armed();
    for i in 0..10 {
        rig.fix(PositionFix::invalid(), 1000 + i * 1000);
    }
    assert_eq!(rig.tracker.state(), DeviceState::SignalLost);
    assert!(rig.tracker.signal_lost());
    assert_eq!(rig.hw.restarts(), 1);
    assert_eq!(rig.hw.indicator(), Some(IndicatorColour::Red));

    // More invalid fixes neither re-enter SignalLost nor restart again.
    for i in 0..15 {
        rig.fix(PositionFix::invalid(), 11_000 + i * 1000);
    }
    assert_eq!(rig.hw.restarts(), 1);

    rig.fix(fix_north(0.0), 30_000);
    assert_eq!(rig.tracker.state(), DeviceState::Tracking);
    assert_eq!(rig.tracker.invalid_fix_count(), 0);
    assert!(!rig.tracker.signal_lost());
    assert_eq!(rig.hw.indicator(), Some(IndicatorColour::Green));

    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SignalLost { .. })),
        1
    );
    assert_eq!(rig.sink.count(|e| *e == AppEvent::SignalRestored), 1);
}

#[test]
fn invalid_fixes_before_tracking_never_count() {
    let mut rig = Rig::new();
    for i in 0..25 {
        rig.fix(PositionFix::invalid(), i * 100);
    }
    assert_eq!(rig.tracker.state(), DeviceState::Searching);
    assert_eq!(rig.tracker.invalid_fix_count(), 0);

    rig.fix(fix_north(0.0), 3000);
    for i in 0..25 {
        rig.fix(PositionFix::invalid(), 4000 + i * 100);
    }
    assert_eq!(rig.tracker.state(), DeviceState::WaitingForAnchor);
    assert_eq!(rig.hw.restarts(), 0);
}

#[test]
fn failed_receiver_restart_is_not_fatal() {
    let mut rig = Rig::armed();
    rig.hw.fail_restart = true;
    for i in 0..10 {
        rig.fix(PositionFix::invalid(), 1000 + i * 1000);
    }
    assert_eq!(rig.tracker.state(), DeviceState::SignalLost);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::ReceiverRestartFailed(_))),
        1
    );

    rig.fix(fix_north(0.0), 20_000);
    assert_eq!(rig.tracker.state(), DeviceState::Tracking);
}

// ── Status queue ──────────────────────────────────────────────

#[test]
fn queue_overflow_keeps_only_newest() {
    let mut rig = Rig::armed();
    rig.drain();

    for i in 0..16u32 {
        rig.fix(fix_north(f64::from(i)), 1000 + u64::from(i) * 100);
    }
    assert_eq!(rig.statuses.len(), 16);

    rig.fix(fix_north(99.0), 9000);
    assert_eq!(rig.statuses.len(), 1);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::StatusPurged { dropped: 16 })
    );

    let (newest, _) = rig.statuses.take_latest().unwrap();
    assert!((newest.latitude - fix_north(99.0).latitude).abs() < 1e-12);
}
