//! Integration tests for the SensorService → SharedReadings →
//! TrackerService status path.

use super::mock_hw::{MockEnvironment, MockHardware, MockImu, RecordingSink, fix_north};

use herdtag::app::events::AppEvent;
use herdtag::app::sensor_service::SensorService;
use herdtag::app::service::TrackerService;
use herdtag::config::SystemConfig;
use herdtag::error::Error;
use herdtag::fsm::DeviceState;
use herdtag::posture::{OrientationSample, PostureState};
use herdtag::sensors::SharedReadings;

const TICK_MS: u32 = 100;

struct Rig {
    sensors: SensorService,
    imu: MockImu,
    env: MockEnvironment,
    readings: SharedReadings,
    sink: RecordingSink,
}

impl Rig {
    fn new(imu: MockImu) -> Self {
        Self {
            sensors: SensorService::new(&SystemConfig::default()),
            imu,
            env: MockEnvironment::default(),
            readings: SharedReadings::new(),
            sink: RecordingSink::new(),
        }
    }

    fn run_ms(&mut self, ms: u32) {
        for _ in 0..ms / TICK_MS {
            self.sensors.tick(
                TICK_MS,
                &mut self.imu,
                &mut self.env,
                &self.readings,
                &mut self.sink,
            );
        }
    }
}

#[test]
fn duty_cycle_alternates_five_and_ten_seconds() {
    let mut rig = Rig::new(MockImu::default());
    rig.sensors.start(&mut rig.imu, &mut rig.sink).unwrap();

    rig.run_ms(4900);
    assert!(!rig.sensors.window_open());
    rig.run_ms(100);
    assert!(rig.sensors.window_open());
    assert!(rig.imu.powered);

    rig.run_ms(9900);
    assert!(rig.sensors.window_open());
    rig.run_ms(100);
    assert!(!rig.sensors.window_open());
    assert!(!rig.imu.powered);

    rig.run_ms(5000);
    assert!(rig.sensors.window_open());
    // Probe plus two window openings.
    assert_eq!(rig.imu.activations, 3);
}

#[test]
fn lean_flows_into_composed_status() {
    let mut rig = Rig::new(MockImu::default());
    rig.sensors.start(&mut rig.imu, &mut rig.sink).unwrap();

    // Open the window and take the baseline at level.
    rig.run_ms(5100);
    rig.imu.sample = OrientationSample {
        heading_deg: 0.0,
        roll_deg: 0.0,
        pitch_deg: -20.0,
    };
    rig.run_ms(1000);
    assert_eq!(rig.readings.snapshot().posture.state, PostureState::Front);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::PostureChanged(p) if p.state == PostureState::Front
        )),
        1
    );

    let mut tracker = TrackerService::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    tracker.start(&mut hw, &mut rig.sink);
    let status = tracker.ingest(fix_north(0.0), 0, &rig.readings, &mut hw, &mut rig.sink);
    assert_eq!(status.posture.state, PostureState::Front);
    assert!((status.posture.pitch_deg + 20.0).abs() < 1e-6);
}

#[test]
fn environment_reads_only_outside_the_window() {
    let mut rig = Rig::new(MockImu::default());
    rig.sensors.start(&mut rig.imu, &mut rig.sink).unwrap();

    rig.run_ms(5000);
    let before_window = rig.env.reads;
    assert!(before_window >= 4);

    rig.run_ms(10_000);
    assert_eq!(rig.env.reads, before_window);
    assert!(rig.imu.reads > 90);

    let env = rig.readings.snapshot().environment.unwrap();
    assert!((env.temperature_c - 21.5).abs() < 1e-6);
}

#[test]
fn missing_imu_disables_posture_but_tracking_continues() {
    let mut rig = Rig::new(MockImu {
        absent: true,
        ..MockImu::default()
    });
    assert_eq!(
        rig.sensors.start(&mut rig.imu, &mut rig.sink),
        Err(Error::Init("orientation sensor probe failed"))
    );
    assert!(!rig.sensors.posture_enabled());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::SubsystemDisabled("posture"))
    );

    rig.run_ms(30_000);
    assert_eq!(rig.imu.activations, 1);
    assert!(rig.env.reads >= 25);

    let mut tracker = TrackerService::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    tracker.start(&mut hw, &mut rig.sink);
    tracker.ingest(fix_north(0.0), 0, &rig.readings, &mut hw, &mut rig.sink);
    assert_eq!(tracker.state(), DeviceState::WaitingForAnchor);
}

#[test]
fn failing_environment_sensor_is_retried() {
    let mut rig = Rig::new(MockImu::default());
    rig.env.failing = true;
    rig.sensors.start(&mut rig.imu, &mut rig.sink).unwrap();

    rig.run_ms(3000);
    assert!(rig.readings.snapshot().environment.is_none());
    assert_eq!(rig.sensors.read_errors(), rig.env.reads);

    rig.env.failing = false;
    rig.run_ms(1000);
    assert!(rig.readings.snapshot().environment.is_some());
}
