//! Position-fix value types.
//!
//! A [`PositionFix`] is one solution reported by the receiver.  Fixes are
//! plain `Copy` values: the interrupt-side handler copies the receiver's
//! frame into one and pushes it onto the event queue, and the tracker
//! keeps only the most recent valid one.

use core::fmt;

use serde::{Deserialize, Serialize};

/// UTC calendar time carried by a fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millis: u16,
}

impl UtcDateTime {
    /// Hour-of-day shifted by a fixed offset, wrapped into 0–23.
    ///
    /// The date is not adjusted; this is only used for log output.
    pub fn local_hour(&self, utc_offset_hours: i8) -> u8 {
        (i16::from(self.hour) + i16::from(utc_offset_hours)).rem_euclid(24) as u8
    }
}

impl fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.millis
        )
    }
}

/// One position solution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Degrees, WGS-84.
    pub latitude: f64,
    /// Degrees, WGS-84.
    pub longitude: f64,
    /// Metres above the ellipsoid.
    pub altitude: f64,
    /// Estimated horizontal accuracy (m).
    pub accuracy_m: f32,
    /// `false` when the receiver had no solution; other fields are then
    /// meaningless.
    pub valid: bool,
    pub timestamp: UtcDateTime,
    /// Horizontal speed (m/s).
    pub speed_mps: f32,
    /// Course over ground (degrees).
    pub heading_deg: f32,
}

impl PositionFix {
    /// A "no solution" report.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// A valid fix at the given coordinates with all other fields zeroed.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            valid: true,
            ..Self::default()
        }
    }
}

/// The user-designated reference point (the water trough).
///
/// Only ever constructed from a valid fix; "no anchor yet" is
/// `Option::None` at the holder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceAnchor {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy_m: f32,
}

impl GeofenceAnchor {
    /// Snapshot the position of `fix`.  Returns `None` for an invalid fix.
    pub fn from_fix(fix: &PositionFix) -> Option<Self> {
        fix.valid.then_some(Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            accuracy_m: fix.accuracy_m,
        })
    }
}
