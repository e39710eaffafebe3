//! Sensor service: duty-cycled orientation sampling and environment
//! reads.
//!
//! ```text
//!  DutyCycle ──Opened──▶ OrientationPort::activate + classifier re-baseline
//!            ──Closed──▶ OrientationPort::deactivate
//!
//!  window open   : one orientation sample per cadence tick → classifier
//!                  → SharedReadings::set_posture
//!  window closed : one environment read per cadence tick
//!                  → SharedReadings::set_environment
//! ```
//!
//! A failed startup probe disables posture monitoring for the rest of
//! the power cycle; environment reads then run continuously.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::{Error, SensorError};
use crate::posture::{PostureClassifier, PostureSnapshot};
use crate::scheduler::{DutyCycle, Interval, WindowEdge};
use crate::sensors::SharedReadings;

use super::events::AppEvent;
use super::ports::{EnvironmentPort, EventSink, OrientationPort};

pub struct SensorService {
    classifier: PostureClassifier,
    duty: DutyCycle,
    sample_cadence: Interval,
    environment_cadence: Interval,
    posture_enabled: bool,
    /// Orientation sensor powered and configured for the open window.
    sensor_ready: bool,
    read_errors: u32,
}

impl SensorService {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            classifier: PostureClassifier::from_config(config),
            duty: DutyCycle::from_config(config),
            sample_cadence: Interval::new(config.orientation_sample_interval_ms),
            environment_cadence: Interval::new(config.environment_read_interval_ms),
            posture_enabled: true,
            sensor_ready: false,
            read_errors: 0,
        }
    }

    /// Probe the orientation sensor once and leave it powered down.
    ///
    /// A probe failure only disables posture monitoring; the error is
    /// returned so the caller can log it.
    pub fn start(
        &mut self,
        orientation: &mut impl OrientationPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match orientation.activate() {
            Ok(()) => {
                orientation.deactivate();
                info!("SensorService: orientation sensor present, posture enabled");
                Ok(())
            }
            Err(e) => {
                self.posture_enabled = false;
                warn!("SensorService: orientation probe failed ({}), posture disabled", e);
                sink.emit(&AppEvent::SubsystemDisabled("posture"));
                Err(Error::Init("orientation sensor probe failed"))
            }
        }
    }

    /// Advance by `elapsed_ms`.  Call at the orientation sample cadence.
    pub fn tick(
        &mut self,
        elapsed_ms: u32,
        orientation: &mut impl OrientationPort,
        environment: &mut impl EnvironmentPort,
        readings: &SharedReadings,
        sink: &mut impl EventSink,
    ) {
        if let Some(edge) = self.duty.tick(elapsed_ms) {
            if self.posture_enabled {
                self.on_edge(edge, orientation);
                return;
            }
        }

        if self.posture_enabled && self.duty.is_active() {
            if self.sensor_ready && self.sample_cadence.tick(elapsed_ms) {
                self.sample_orientation(orientation, readings, sink);
            }
        } else if self.environment_cadence.tick(elapsed_ms) {
            match environment.read_environment() {
                Ok(reading) => readings.set_environment(reading),
                Err(e) => self.note_read_error("environment", e),
            }
        }
    }

    fn on_edge(&mut self, edge: WindowEdge, orientation: &mut impl OrientationPort) {
        self.sample_cadence.reset();
        self.environment_cadence.reset();

        match edge {
            WindowEdge::Opened => match orientation.activate() {
                Ok(()) => {
                    self.classifier.activate();
                    self.sensor_ready = true;
                }
                Err(e) => {
                    self.sensor_ready = false;
                    self.note_read_error("orientation bring-up", e);
                }
            },
            WindowEdge::Closed => {
                if self.sensor_ready {
                    orientation.deactivate();
                }
                self.sensor_ready = false;
            }
        }
    }

    fn sample_orientation(
        &mut self,
        orientation: &mut impl OrientationPort,
        readings: &SharedReadings,
        sink: &mut impl EventSink,
    ) {
        let sample = match orientation.read_sample() {
            Ok(s) => s,
            Err(e) => {
                self.note_read_error("orientation", e);
                return;
            }
        };

        let out = self.classifier.classify(&sample);
        let snapshot = PostureSnapshot {
            state: out.state,
            roll_deg: sample.roll_deg,
            pitch_deg: sample.pitch_deg,
        };
        readings.set_posture(snapshot);
        if out.changed {
            sink.emit(&AppEvent::PostureChanged(snapshot));
        }
    }

    fn note_read_error(&mut self, what: &str, e: SensorError) {
        self.read_errors = self.read_errors.saturating_add(1);
        warn!("SensorService: {} read failed: {}", what, e);
    }

    pub fn posture_enabled(&self) -> bool {
        self.posture_enabled
    }

    pub fn window_open(&self) -> bool {
        self.duty.is_active()
    }

    /// Transient read failures since startup.
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }
}
