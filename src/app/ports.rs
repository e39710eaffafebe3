//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TrackerService / SensorService / TelemetryPublisher
//! ```
//!
//! Driven adapters (receiver control, indicator, sensors, event sinks,
//! uplink) implement these traits.  The services consume them via
//! generics, so the domain core never touches hardware directly.
//!
//! All port errors are typed and `Copy`; none of them is fatal.

use crate::error::{CommsError, ReceiverError, SensorError};
use crate::fsm::context::IndicatorColour;
use crate::posture::OrientationSample;
use crate::sensors::EnvironmentReading;

// ───────────────────────────────────────────────────────────────
// Receiver port (driven adapter: domain → position receiver)
// ───────────────────────────────────────────────────────────────

/// Control side of the position receiver.
pub trait ReceiverPort {
    /// Ask the receiver to stop and start again.  Fire-and-forget: the
    /// caller logs a failure and carries on.
    fn restart_receiver(&mut self) -> Result<(), ReceiverError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → status LED)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    fn set_indicator(&mut self, colour: IndicatorColour);
}

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapters: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Inertial orientation sensor with power control.
pub trait OrientationPort {
    /// Power up and configure the sensor.  Called at startup as a probe
    /// and at the start of every sampling window.
    fn activate(&mut self) -> Result<(), SensorError>;

    /// Power the sensor down between windows.
    fn deactivate(&mut self);

    /// Read one fused Euler sample.
    fn read_sample(&mut self) -> Result<OrientationSample, SensorError>;
}

/// Temperature / humidity / pressure sensor.
pub trait EnvironmentPort {
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Publish port (driven adapter: domain → cloud uplink)
// ───────────────────────────────────────────────────────────────

/// Hands an encoded payload to the uplink.  Transport, TLS and broker
/// session live on the other side of this trait.
pub trait PublishPort {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;
}
