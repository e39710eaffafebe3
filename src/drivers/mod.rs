//! Board-level drivers: the anchor-arm button, its interrupt set-up and
//! the status indicator.
//!
//! Sensor drivers live in [`crate::sensors`].

pub mod button;
pub mod hw_init;
pub mod indicator;
