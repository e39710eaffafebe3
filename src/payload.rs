//! Fixed-point telemetry payload.
//!
//! The uplink carries integers only.  Every scaled field is produced by
//! rounding half away from zero and saturating to the `i32` range, so a
//! reading of 21.996 °C becomes `2200`, not `2199`.
//!
//! | Field         | Source                          | Scale     |
//! |---------------|---------------------------------|-----------|
//! | `water_flag`  | anchor armed in this batch      | bool      |
//! | `water_time`  | cumulative trough dwell (s)     | 1         |
//! | `temperature` | environment °C                  | ×100      |
//! | `moisture`    | relative humidity %             | ×100      |
//! | `pitch`       | posture pitch (deg)             | ×100      |
//! | `latitude`    | last known latitude (deg)       | ×1000000  |
//! | `longitude`   | last known longitude (deg)      | ×1000000  |

use serde::Serialize;

use crate::app::events::StatusMessage;
use crate::error::CommsError;
use crate::sensors::EnvironmentReading;

pub const CENTI: f64 = 100.0;
pub const MICRO_DEG: f64 = 1_000_000.0;

/// Scale, round half away from zero, and saturate.  NaN maps to 0.
pub fn scale_to_i32(value: f64, scale: f64) -> i32 {
    let scaled = (value * scale).round();
    if scaled.is_nan() {
        0
    } else if scaled >= f64::from(i32::MAX) {
        i32::MAX
    } else if scaled <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        scaled as i32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryPayload {
    pub water_flag: bool,
    pub water_time: i64,
    pub temperature: i32,
    pub moisture: i32,
    pub pitch: i32,
    pub latitude: i32,
    pub longitude: i32,
}

impl TelemetryPayload {
    /// Build from the last known status (if any), the batch's anchor flag
    /// and the latest environment reading (if any).
    pub fn compose(
        status: Option<&StatusMessage>,
        water_flag: bool,
        environment: Option<&EnvironmentReading>,
    ) -> Self {
        let mut payload = Self {
            water_flag,
            ..Self::default()
        };

        if let Some(s) = status {
            let secs = s.total_dwell_secs.round();
            payload.water_time = if secs.is_finite() { secs as i64 } else { 0 };
            payload.pitch = scale_to_i32(f64::from(s.posture.pitch_deg), CENTI);
            payload.latitude = scale_to_i32(s.latitude, MICRO_DEG);
            payload.longitude = scale_to_i32(s.longitude, MICRO_DEG);
        }
        if let Some(env) = environment {
            payload.temperature = scale_to_i32(f64::from(env.temperature_c), CENTI);
            payload.moisture = scale_to_i32(f64::from(env.humidity_pct), CENTI);
        }
        payload
    }

    pub fn to_json(&self) -> Result<Vec<u8>, CommsError> {
        serde_json::to_vec(self).map_err(|_| CommsError::EncodeFailed)
    }
}
