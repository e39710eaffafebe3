//! Unified error types for the HerdTag firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the consumer loops' error handling uniform.  All variants are `Copy`
//! so they can travel through the FSM context and the event sink
//! without allocation.
//!
//! | Category                 | Type               | Handling                       |
//! |--------------------------|--------------------|--------------------------------|
//! | Transient I/O            | `SensorError`,     | logged, retried next cycle     |
//! |                          | `ReceiverError`,   |                                |
//! |                          | `CommsError`       |                                |
//! | Configuration            | `Init`, `Config`   | disables the owning subsystem  |
//! | Invalid state transition | `TransitionError`  | rejected with a diagnostic     |

use core::fmt;

use crate::fsm::DeviceState;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// The position receiver could not be controlled.
    Receiver(ReceiverError),
    /// A command arrived in a state that does not accept it.
    Transition(TransitionError),
    /// The uplink boundary failed.
    Comms(CommsError),
    /// A required peripheral was unavailable at startup.
    Init(&'static str),
    /// Configuration is out of range.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Receiver(e) => write!(f, "receiver: {e}"),
            Self::Transition(e) => write!(f, "transition: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction failed or was NACKed.
    BusFault,
    /// The device answered with an unexpected chip identifier.
    WrongChipId(u8),
    /// Sensor is powered down or still booting.
    NotReady,
    /// GPIO write failed.
    GpioWriteFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFault => write!(f, "I2C bus fault"),
            Self::WrongChipId(id) => write!(f, "unexpected chip id 0x{id:02X}"),
            Self::NotReady => write!(f, "sensor not ready"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Receiver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverError {
    /// A previous restart request has not been serviced yet.
    RestartPending,
    /// Stopping or starting the receiver failed.
    RestartFailed,
}

impl fmt::Display for ReceiverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestartPending => write!(f, "restart already pending"),
            Self::RestartFailed => write!(f, "restart failed"),
        }
    }
}

impl From<ReceiverError> for Error {
    fn from(e: ReceiverError) -> Self {
        Self::Receiver(e)
    }
}

// ---------------------------------------------------------------------------
// Transition errors
// ---------------------------------------------------------------------------

/// Rejections of user-initiated commands.  These never mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Arming is only accepted in `WaitingForAnchor`.
    NotAwaitingAnchor(DeviceState),
    /// Arming needs a valid latest fix to copy into the anchor.
    NoValidFix,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAwaitingAnchor(state) => {
                write!(f, "anchor arm rejected in state {state:?}")
            }
            Self::NoValidFix => write!(f, "anchor arm rejected: no valid fix"),
        }
    }
}

impl From<TransitionError> for Error {
    fn from(e: TransitionError) -> Self {
        Self::Transition(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The uplink is not connected.
    NotConnected,
    /// The transport refused the message.
    PublishFailed,
    /// The payload could not be encoded.
    EncodeFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "uplink not connected"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::EncodeFailed => write!(f, "payload encode failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
