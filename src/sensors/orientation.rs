//! BNO055 9-axis orientation sensor over I2C.
//!
//! The sensor has its own power switch.  Every sampling window starts
//! with a full power-up: switch on, wait for boot, check the chip id,
//! then move from CONFIG to NDOF fusion mode.  Between windows it is
//! switched off.
//!
//! Euler angles are read as three little-endian `i16` values
//! (heading, roll, pitch) in 1/16 degree units.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::app::ports::OrientationPort;
use crate::error::SensorError;
use crate::posture::OrientationSample;

/// Default I2C address (COM3 low).
pub const BNO055_ADDR: u8 = 0x28;

const REG_CHIP_ID: u8 = 0x00;
const REG_EUL_HEADING_LSB: u8 = 0x1A;
const REG_OPR_MODE: u8 = 0x3D;
const REG_PWR_MODE: u8 = 0x3E;

const CHIP_ID: u8 = 0xA0;
const MODE_CONFIG: u8 = 0x00;
const MODE_NDOF: u8 = 0x0C;
const PWR_NORMAL: u8 = 0x00;

const BOOT_DELAY_MS: u32 = 700;
const CONFIG_DELAY_MS: u32 = 20;
const PWR_DELAY_MS: u32 = 10;
const FUSION_DELAY_MS: u32 = 50;

/// Euler LSBs per degree.
const EULER_SCALE: f32 = 16.0;

pub struct Bno055<I2C, P, D> {
    i2c: I2C,
    power: P,
    delay: D,
    address: u8,
    ready: bool,
}

impl<I2C, P, D> Bno055<I2C, P, D>
where
    I2C: I2c,
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(i2c: I2C, power: P, delay: D) -> Self {
        Self {
            i2c,
            power,
            delay,
            address: BNO055_ADDR,
            ready: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|_| SensorError::BusFault)
    }

    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(self.address, &[reg], buf)
            .map_err(|_| SensorError::BusFault)
    }

    fn power_off(&mut self) {
        self.ready = false;
        if self.power.set_low().is_err() {
            warn!("BNO055: power pin write failed");
        }
    }

    fn configure(&mut self) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        self.read_regs(REG_CHIP_ID, &mut id)?;
        if id[0] != CHIP_ID {
            return Err(SensorError::WrongChipId(id[0]));
        }

        self.write_reg(REG_OPR_MODE, MODE_CONFIG)?;
        self.delay.delay_ms(CONFIG_DELAY_MS);
        self.write_reg(REG_PWR_MODE, PWR_NORMAL)?;
        self.delay.delay_ms(PWR_DELAY_MS);
        self.write_reg(REG_OPR_MODE, MODE_NDOF)?;
        self.delay.delay_ms(FUSION_DELAY_MS);
        Ok(())
    }
}

/// Decode the six Euler bytes starting at `EUL_HEADING_LSB`.
pub fn decode_euler(raw: &[u8; 6]) -> OrientationSample {
    let axis = |i: usize| f32::from(i16::from_le_bytes([raw[i], raw[i + 1]])) / EULER_SCALE;
    OrientationSample {
        heading_deg: axis(0),
        roll_deg: axis(2),
        pitch_deg: axis(4),
    }
}

impl<I2C, P, D> OrientationPort for Bno055<I2C, P, D>
where
    I2C: I2c,
    P: OutputPin,
    D: DelayNs,
{
    fn activate(&mut self) -> Result<(), SensorError> {
        self.power.set_high().map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_ms(BOOT_DELAY_MS);

        match self.configure() {
            Ok(()) => {
                self.ready = true;
                info!("BNO055: NDOF fusion running");
                Ok(())
            }
            Err(e) => {
                warn!("BNO055: bring-up failed: {}", e);
                self.power_off();
                Err(e)
            }
        }
    }

    fn deactivate(&mut self) {
        debug!("BNO055: powering down");
        self.power_off();
    }

    fn read_sample(&mut self) -> Result<OrientationSample, SensorError> {
        if !self.ready {
            return Err(SensorError::NotReady);
        }
        let mut raw = [0u8; 6];
        self.read_regs(REG_EUL_HEADING_LSB, &mut raw)?;
        Ok(decode_euler(&raw))
    }
}
