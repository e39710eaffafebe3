//! Mock adapters for integration tests.
//!
//! Each mock records every call so tests can assert on the full command
//! history without touching real I2C, GPIO or the modem.

use herdtag::app::events::AppEvent;
use herdtag::app::ports::{
    EnvironmentPort, EventSink, IndicatorPort, OrientationPort, PublishPort, ReceiverPort,
};
use herdtag::error::{CommsError, ReceiverError, SensorError};
use herdtag::fix::PositionFix;
use herdtag::fsm::context::IndicatorColour;
use herdtag::geofence::EARTH_RADIUS_M;
use herdtag::posture::OrientationSample;
use herdtag::sensors::EnvironmentReading;

// ── Fix helpers ───────────────────────────────────────────────

pub const ANCHOR_LAT: f64 = 40.0;
pub const ANCHOR_LON: f64 = -75.0;

/// A valid fix `metres` due north of the test anchor.
pub fn fix_north(metres: f64) -> PositionFix {
    PositionFix::at(
        ANCHOR_LAT + (metres / EARTH_RADIUS_M).to_degrees(),
        ANCHOR_LON,
    )
}

// ── Tracker hardware call record ──────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    RestartReceiver,
    Indicator(IndicatorColour),
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<HwCall>,
    pub fail_restart: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restarts(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == HwCall::RestartReceiver)
            .count()
    }

    pub fn indicator(&self) -> Option<IndicatorColour> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Indicator(colour) => Some(*colour),
            HwCall::RestartReceiver => None,
        })
    }
}

impl ReceiverPort for MockHardware {
    fn restart_receiver(&mut self) -> Result<(), ReceiverError> {
        self.calls.push(HwCall::RestartReceiver);
        if self.fail_restart {
            Err(ReceiverError::RestartFailed)
        } else {
            Ok(())
        }
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, colour: IndicatorColour) {
        self.calls.push(HwCall::Indicator(colour));
    }
}

// ── MockImu ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockImu {
    pub powered: bool,
    pub absent: bool,
    pub activations: u32,
    pub reads: u32,
    pub sample: OrientationSample,
}

impl OrientationPort for MockImu {
    fn activate(&mut self) -> Result<(), SensorError> {
        self.activations += 1;
        if self.absent {
            return Err(SensorError::WrongChipId(0xFF));
        }
        self.powered = true;
        Ok(())
    }

    fn deactivate(&mut self) {
        self.powered = false;
    }

    fn read_sample(&mut self) -> Result<OrientationSample, SensorError> {
        if !self.powered {
            return Err(SensorError::NotReady);
        }
        self.reads += 1;
        Ok(self.sample)
    }
}

// ── MockEnvironment ───────────────────────────────────────────

pub struct MockEnvironment {
    pub reading: EnvironmentReading,
    pub reads: u32,
    pub failing: bool,
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self {
            reading: EnvironmentReading {
                temperature_c: 21.5,
                humidity_pct: 40.25,
                pressure_kpa: 101.3,
            },
            reads: 0,
            failing: false,
        }
    }
}

impl EnvironmentPort for MockEnvironment {
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError> {
        self.reads += 1;
        if self.failing {
            Err(SensorError::BusFault)
        } else {
            Ok(self.reading)
        }
    }
}

// ── MockUplink ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockUplink {
    pub sent: Vec<(String, String)>,
    pub offline: bool,
}

impl PublishPort for MockUplink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if self.offline {
            return Err(CommsError::NotConnected);
        }
        self.sent.push((
            topic.to_string(),
            String::from_utf8_lossy(payload).into_owned(),
        ));
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
