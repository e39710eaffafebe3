//! Integration tests for TrackerService → StatusQueue →
//! TelemetryPublisher → PublishPort.

use super::mock_hw::{MockHardware, MockUplink, RecordingSink, fix_north};

use herdtag::app::events::AppEvent;
use herdtag::app::publisher::{TELEMETRY_TOPIC, TelemetryPublisher};
use herdtag::app::service::TrackerService;
use herdtag::app::status_queue::StatusQueue;
use herdtag::config::SystemConfig;
use herdtag::error::CommsError;
use herdtag::fix::PositionFix;
use herdtag::sensors::{EnvironmentReading, SharedReadings};

struct Rig {
    tracker: TrackerService,
    queue: StatusQueue,
    readings: SharedReadings,
    hw: MockHardware,
    sink: RecordingSink,
    publisher: TelemetryPublisher,
    uplink: MockUplink,
}

impl Rig {
    fn new() -> Self {
        let config = SystemConfig::default();
        let mut rig = Self {
            tracker: TrackerService::new(config.clone()),
            queue: StatusQueue::new(),
            readings: SharedReadings::new(),
            hw: MockHardware::new(),
            sink: RecordingSink::new(),
            publisher: TelemetryPublisher::new(&config),
            uplink: MockUplink::default(),
        };
        rig.tracker.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    fn fix(&mut self, fix: PositionFix, now_ms: u64) {
        let status = self
            .tracker
            .ingest(fix, now_ms, &self.readings, &mut self.hw, &mut self.sink);
        self.queue.push_reporting(status, &mut self.sink);
    }

    fn publish(&mut self) -> Result<(), CommsError> {
        self.publisher
            .publish_now(&self.queue, &self.readings, &mut self.uplink)
    }

    fn last_json(&self) -> &str {
        &self.uplink.sent.last().unwrap().1
    }
}

#[test]
fn payload_carries_scaled_fields() {
    let mut rig = Rig::new();
    rig.readings.set_environment(EnvironmentReading {
        temperature_c: 21.996,
        humidity_pct: 55.5,
        pressure_kpa: 100.9,
    });
    rig.fix(PositionFix::at(40.123_456_7, -75.5), 0);
    rig.publish().unwrap();

    let (topic, json) = rig.uplink.sent.last().unwrap();
    assert_eq!(topic, TELEMETRY_TOPIC);
    assert!(json.contains(r#""temperature":2200"#), "{json}");
    assert!(json.contains(r#""moisture":5550"#), "{json}");
    assert!(json.contains(r#""latitude":40123457"#), "{json}");
    assert!(json.contains(r#""longitude":-75500000"#), "{json}");
    assert!(json.contains(r#""water_flag":false"#), "{json}");
}

#[test]
fn anchor_flag_survives_later_statuses_in_batch() {
    let mut rig = Rig::new();
    rig.fix(fix_north(0.0), 0);
    rig.tracker.arm_anchor(&mut rig.hw, &mut rig.sink).unwrap();
    rig.fix(fix_north(0.0), 1000);
    rig.fix(fix_north(2.0), 2000);
    rig.fix(fix_north(2.0), 3000);

    rig.publish().unwrap();
    assert!(rig.last_json().contains(r#""water_flag":true"#));

    rig.fix(fix_north(2.0), 4000);
    rig.publish().unwrap();
    assert!(rig.last_json().contains(r#""water_flag":false"#));
}

#[test]
fn anchor_flag_survives_queue_purge() {
    let mut rig = Rig::new();
    rig.fix(fix_north(0.0), 0);
    rig.tracker.arm_anchor(&mut rig.hw, &mut rig.sink).unwrap();
    // Enough fixes to overflow the queue past the armed status.
    for i in 1..=40u64 {
        rig.fix(fix_north(2.0), i * 1000);
    }
    assert!(rig.sink.count(|e| matches!(e, AppEvent::StatusPurged { .. })) >= 1);

    rig.publish().unwrap();
    assert!(rig.last_json().contains(r#""water_flag":true"#), "{}", rig.last_json());
}

#[test]
fn water_time_accumulates_whole_seconds() {
    let mut rig = Rig::new();
    rig.fix(fix_north(0.0), 0);
    rig.tracker.arm_anchor(&mut rig.hw, &mut rig.sink).unwrap();
    rig.fix(fix_north(3.0), 1000);
    rig.fix(fix_north(60.0), 7400);

    rig.publish().unwrap();
    assert!(rig.last_json().contains(r#""water_time":6"#), "{}", rig.last_json());
}

#[test]
fn outage_then_publish_sends_freshest_position() {
    let mut rig = Rig::new();
    rig.uplink.offline = true;
    for i in 0..40u32 {
        rig.fix(fix_north(f64::from(i)), u64::from(i) * 1000);
        if i % 10 == 9 {
            assert_eq!(rig.publish(), Err(CommsError::NotConnected));
        }
    }
    assert_eq!(rig.publisher.failures(), 4);

    rig.fix(fix_north(123.0), 50_000);
    rig.uplink.offline = false;
    rig.publish().unwrap();

    let expected = (fix_north(123.0).latitude * 1_000_000.0).round() as i64;
    assert!(
        rig.last_json()
            .contains(&format!(r#""latitude":{expected}"#)),
        "{}",
        rig.last_json()
    );
}

#[test]
fn no_status_yet_publishes_zeroed_position() {
    let mut rig = Rig::new();
    rig.publish().unwrap();
    assert_eq!(
        rig.last_json(),
        r#"{"water_flag":false,"water_time":0,"temperature":0,"moisture":0,"pitch":0,"latitude":0,"longitude":0}"#
    );
}

#[test]
fn cadence_publishes_every_two_minutes() {
    let mut rig = Rig::new();
    rig.fix(fix_north(0.0), 0);
    for _ in 0..360 {
        let _ = rig
            .publisher
            .tick(1000, &rig.queue, &rig.readings, &mut rig.uplink);
    }
    assert_eq!(rig.uplink.sent.len(), 3);
    assert_eq!(rig.publisher.published(), 3);
}
