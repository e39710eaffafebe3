//! Sensor subsystem: I2C drivers and the shared readings cell.
//!
//! The sensor loop writes into [`SharedReadings`]; the tracker loop reads
//! one consistent [`ReadingsSnapshot`] per composed status.

pub mod environment;
pub mod orientation;

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::posture::PostureSnapshot;

pub use environment::{Bme280, EnvironmentReading};
pub use orientation::Bno055;

/// Everything the status composer needs from the sensor loop, copied
/// out in one critical section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadingsSnapshot {
    pub posture: PostureSnapshot,
    /// `None` until the first successful environment read.
    pub environment: Option<EnvironmentReading>,
}

/// Mutex-guarded copy cell shared between the sensor loop and readers.
pub struct SharedReadings {
    inner: Mutex<CriticalSectionRawMutex, Cell<ReadingsSnapshot>>,
}

impl SharedReadings {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(ReadingsSnapshot {
                posture: PostureSnapshot::EMPTY,
                environment: None,
            })),
        }
    }

    pub fn set_posture(&self, posture: PostureSnapshot) {
        self.inner.lock(|cell| {
            let mut snap = cell.get();
            snap.posture = posture;
            cell.set(snap);
        });
    }

    pub fn set_environment(&self, reading: EnvironmentReading) {
        self.inner.lock(|cell| {
            let mut snap = cell.get();
            snap.environment = Some(reading);
            cell.set(snap);
        });
    }

    pub fn snapshot(&self) -> ReadingsSnapshot {
        self.inner.lock(Cell::get)
    }
}

impl Default for SharedReadings {
    fn default() -> Self {
        Self::new()
    }
}

/// Device-wide readings cell.
pub static READINGS: SharedReadings = SharedReadings::new();
