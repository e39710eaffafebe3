//! HerdTag firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fix;
pub mod fsm;
pub mod geofence;
pub mod payload;
pub mod pins;
pub mod posture;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
pub mod sensors;
