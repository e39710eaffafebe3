//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the HerdTag device:
//! fix ingestion and the tracker FSM, duty-cycled sensing, status
//! queueing and telemetry publishing.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod publisher;
pub mod sensor_service;
pub mod service;
pub mod status_queue;
