//! Circular geofence around the trough and the visit detector.
//!
//! ```text
//!             outside ──[distance <= radius]──▶ inside
//!                ▲                                 │
//!                └───────[distance > radius]───────┘
//!                         dwell = now - entered_at
//!                         dwell >= min  → VisitEvent, add to stats
//!                         dwell <  min  → discarded
//! ```
//!
//! Timestamps are monotonic milliseconds supplied by the caller, so dwell
//! is unaffected by receiver time jumps and keeps counting across a
//! signal-loss episode.

use log::{debug, info};

use crate::config::SystemConfig;
use crate::fix::{GeofenceAnchor, PositionFix};

/// Mean Earth radius used by the haversine formula (m).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in metres between two WGS-84 points (degrees).
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Entry half of an open visit.  Timestamp and fix are set together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneEntry {
    pub entered_at_ms: u64,
    pub fix: PositionFix,
}

/// A completed visit that lasted at least the minimum duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitEvent {
    /// The fix that first landed inside the zone.
    pub entry_fix: PositionFix,
    /// Time spent inside (ms).
    pub dwell_ms: u64,
}

/// Cumulative qualifying dwell.  Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitStats {
    pub total_dwell_ms: u64,
    pub visit_count: u32,
}

impl VisitStats {
    /// Total dwell in seconds for the status message.
    pub fn total_secs(&self) -> f64 {
        self.total_dwell_ms as f64 / 1000.0
    }
}

/// Enter/exit detector for one circular zone.
#[derive(Debug, Clone)]
pub struct VisitDetector {
    radius_m: f64,
    min_duration_ms: u64,
    window: Option<ZoneEntry>,
    stats: VisitStats,
}

impl VisitDetector {
    pub fn new(radius_m: f64, min_duration_ms: u64) -> Self {
        Self {
            radius_m,
            min_duration_ms,
            window: None,
            stats: VisitStats::default(),
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.trough_radius_m, u64::from(config.visit_min_duration_ms))
    }

    /// Feed one valid fix taken at monotonic time `now_ms`.
    ///
    /// Returns a [`VisitEvent`] only on the exit transition of a visit that
    /// lasted at least the minimum duration.
    pub fn update(
        &mut self,
        anchor: &GeofenceAnchor,
        fix: &PositionFix,
        now_ms: u64,
    ) -> Option<VisitEvent> {
        let distance =
            haversine_distance_m(fix.latitude, fix.longitude, anchor.latitude, anchor.longitude);
        let in_zone_now = distance <= self.radius_m;

        match (self.window, in_zone_now) {
            (None, true) => {
                self.window = Some(ZoneEntry {
                    entered_at_ms: now_ms,
                    fix: *fix,
                });
                info!("Geofence: entered trough zone, distance={:.2} m", distance);
                None
            }
            (Some(entry), false) => {
                self.window = None;
                let dwell_ms = now_ms.saturating_sub(entry.entered_at_ms);
                info!(
                    "Geofence: left trough zone after {} ms, distance={:.2} m",
                    dwell_ms, distance
                );

                if dwell_ms < self.min_duration_ms {
                    debug!("Geofence: visit shorter than {} ms, discarded", self.min_duration_ms);
                    return None;
                }

                self.stats.total_dwell_ms = self.stats.total_dwell_ms.saturating_add(dwell_ms);
                self.stats.visit_count = self.stats.visit_count.saturating_add(1);
                Some(VisitEvent {
                    entry_fix: entry.fix,
                    dwell_ms,
                })
            }
            _ => None,
        }
    }

    pub fn in_zone(&self) -> bool {
        self.window.is_some()
    }

    pub fn stats(&self) -> VisitStats {
        self.stats
    }
}
