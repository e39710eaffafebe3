//! System configuration parameters
//!
//! All tunable parameters for the HerdTag device.  Values are compiled-in
//! defaults; there is no persistence across power cycles.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Geofence ---
    /// Radius (m) around the anchor that counts as "at the trough".
    pub trough_radius_m: f64,
    /// Minimum dwell (ms) inside the zone for a visit to count.
    pub visit_min_duration_ms: u32,

    // --- Signal loss ---
    /// Consecutive invalid fixes while tracking before the signal is lost.
    pub no_fix_threshold: u8,

    // --- User input ---
    /// Repeat button edges inside this window (ms) are rejected.
    pub arm_debounce_ms: u32,

    // --- Posture ---
    /// Roll deviation (degrees) that counts as a left/right lean.
    pub lr_threshold_deg: f32,
    /// Pitch deviation (degrees) that counts as a front/hind lean.
    pub fh_threshold_deg: f32,
    /// Consecutive deviating samples before the posture state changes.
    pub posture_min_samples: u8,

    // --- Timing ---
    /// Orientation sample cadence inside an active window (ms).
    pub orientation_sample_interval_ms: u32,
    /// Length of the orientation sampling window (ms).
    pub sampling_window_active_ms: u32,
    /// Gap between orientation windows (ms); environment sampling runs here.
    pub sampling_window_inactive_ms: u32,
    /// Environment sensor read cadence (ms).
    pub environment_read_interval_ms: u32,
    /// Telemetry publish interval (seconds).
    pub publish_interval_secs: u32,

    // --- Logging ---
    /// Fixed offset from UTC used when logging visit start times.
    pub utc_offset_hours: i8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Geofence
            trough_radius_m: 10.0,
            visit_min_duration_ms: 3000,

            // Signal loss
            no_fix_threshold: 10,

            // User input
            arm_debounce_ms: 200,

            // Posture
            lr_threshold_deg: 15.0,
            fh_threshold_deg: 15.0,
            posture_min_samples: 10,

            // Timing
            orientation_sample_interval_ms: 100, // 10 Hz
            sampling_window_active_ms: 10_000,
            sampling_window_inactive_ms: 5_000,
            environment_read_interval_ms: 1000, // 1 Hz
            publish_interval_secs: 120,

            // Logging
            utc_offset_hours: -5,
        }
    }
}

impl SystemConfig {
    /// Reject values that would disable or destabilise a subsystem.
    pub fn validate(&self) -> Result<()> {
        if !(self.trough_radius_m.is_finite() && self.trough_radius_m > 0.0) {
            return Err(Error::Config("trough_radius_m must be positive"));
        }
        if self.no_fix_threshold == 0 {
            return Err(Error::Config("no_fix_threshold must be at least 1"));
        }
        if !(self.lr_threshold_deg.is_finite() && self.lr_threshold_deg > 0.0)
            || !(self.fh_threshold_deg.is_finite() && self.fh_threshold_deg > 0.0)
        {
            return Err(Error::Config("posture thresholds must be positive"));
        }
        if self.posture_min_samples == 0 {
            return Err(Error::Config("posture_min_samples must be at least 1"));
        }
        if self.orientation_sample_interval_ms == 0 || self.environment_read_interval_ms == 0 {
            return Err(Error::Config("sample intervals must be non-zero"));
        }
        if self.sampling_window_active_ms < self.orientation_sample_interval_ms {
            return Err(Error::Config("active window shorter than one sample"));
        }
        if self.publish_interval_secs == 0 {
            return Err(Error::Config("publish_interval_secs must be non-zero"));
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(Error::Config("utc_offset_hours out of range"));
        }
        Ok(())
    }
}
