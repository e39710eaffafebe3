//! Hardware adapter: bridges the receiver link and the indicator to the
//! tracker's port traits.
//!
//! The tracker takes one `impl ReceiverPort + IndicatorPort`; this type
//! is that bundle on the device.

use crate::app::ports::{IndicatorPort, ReceiverPort};
use crate::error::ReceiverError;
use crate::fsm::context::IndicatorColour;

/// Concrete adapter that combines receiver control and the indicator.
pub struct HardwareAdapter<R, L> {
    receiver: R,
    indicator: L,
}

impl<R, L> HardwareAdapter<R, L> {
    pub fn new(receiver: R, indicator: L) -> Self {
        Self {
            receiver,
            indicator,
        }
    }

    pub fn indicator(&self) -> &L {
        &self.indicator
    }
}

// ── ReceiverPort implementation ───────────────────────────────

impl<R: ReceiverPort, L> ReceiverPort for HardwareAdapter<R, L> {
    fn restart_receiver(&mut self) -> Result<(), ReceiverError> {
        self.receiver.restart_receiver()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<R, L: IndicatorPort> IndicatorPort for HardwareAdapter<R, L> {
    fn set_indicator(&mut self, colour: IndicatorColour) {
        self.indicator.set_indicator(colour);
    }
}
