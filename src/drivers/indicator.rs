//! Red/green status indicator.
//!
//! Two discrete LEDs on `embedded-hal` output pins.  Yellow is both on.
//!
//! | Colour | Red | Green | Meaning                     |
//! |--------|-----|-------|-----------------------------|
//! | Red    | on  | off   | searching / signal lost     |
//! | Yellow | on  | on    | waiting for the anchor      |
//! | Green  | off | on    | tracking                    |
//! | Off    | off | off   | not started                 |

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::app::ports::IndicatorPort;
use crate::fsm::context::IndicatorColour;

pub struct RgIndicator<R, G> {
    red: R,
    green: G,
    current: IndicatorColour,
}

impl<R: OutputPin, G: OutputPin> RgIndicator<R, G> {
    pub fn new(red: R, green: G) -> Self {
        let mut led = Self {
            red,
            green,
            current: IndicatorColour::Off,
        };
        led.drive(IndicatorColour::Off);
        led
    }

    fn drive(&mut self, colour: IndicatorColour) {
        let (r, g) = match colour {
            IndicatorColour::Off => (false, false),
            IndicatorColour::Red => (true, false),
            IndicatorColour::Yellow => (true, true),
            IndicatorColour::Green => (false, true),
        };
        let red_ok = self.red.set_state(PinState::from(r)).is_ok();
        let green_ok = self.green.set_state(PinState::from(g)).is_ok();
        if !(red_ok && green_ok) {
            warn!("Indicator: pin write failed for {:?}", colour);
        }
        self.current = colour;
    }

    pub fn current(&self) -> IndicatorColour {
        self.current
    }
}

impl<R: OutputPin, G: OutputPin> IndicatorPort for RgIndicator<R, G> {
    fn set_indicator(&mut self, colour: IndicatorColour) {
        self.drive(colour);
    }
}
