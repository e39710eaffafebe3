//! BME280 temperature / humidity / pressure sensor over I2C.
//!
//! Runs in normal mode with ×1 oversampling on every channel.  Raw ADC
//! values are compensated with the factory trim stored in the device,
//! using the integer formulas from the Bosch datasheet.

use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::EnvironmentPort;
use crate::error::SensorError;

/// Default I2C address (SDO low).
pub const BME280_ADDR: u8 = 0x76;

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIB_TP: u8 = 0x88;
const REG_CALIB_H1: u8 = 0xA1;
const REG_CALIB_H2: u8 = 0xE1;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_DATA: u8 = 0xF7;

const CHIP_ID: u8 = 0x60;
/// Humidity oversampling ×1.
const CTRL_HUM_X1: u8 = 0x01;
/// Temperature ×1, pressure ×1, normal mode.
const CTRL_MEAS_NORMAL_X1: u8 = 0x27;

/// One compensated environment reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentReading {
    pub temperature_c: f32,
    /// Relative humidity (%).
    pub humidity_pct: f32,
    pub pressure_kpa: f32,
}

/// Factory trim parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl Calibration {
    /// Parse the 0x88..0x9F block, the 0xA1 byte and the 0xE1..0xE7 block.
    pub fn parse(tp: &[u8; 24], h1: u8, h: &[u8; 7]) -> Self {
        let u = |i: usize| u16::from_le_bytes([tp[i], tp[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([tp[i], tp[i + 1]]);
        Self {
            t1: u(0),
            t2: s(2),
            t3: s(4),
            p1: u(6),
            p2: s(8),
            p3: s(10),
            p4: s(12),
            p5: s(14),
            p6: s(16),
            p7: s(18),
            p8: s(20),
            p9: s(22),
            h1,
            h2: i16::from_le_bytes([h[0], h[1]]),
            h3: h[2],
            h4: (i16::from(h[3] as i8) << 4) | i16::from(h[4] & 0x0F),
            h5: (i16::from(h[5] as i8) << 4) | i16::from(h[4] >> 4),
            h6: h[6] as i8,
        }
    }

    /// Returns (temperature in 0.01 °C, t_fine).
    pub fn compensate_temperature(&self, adc_t: i32) -> (i32, i32) {
        let adc_t = i64::from(adc_t);
        let t1 = i64::from(self.t1);
        let var1 = (((adc_t >> 3) - (t1 << 1)) * i64::from(self.t2)) >> 11;
        let var2 = (((((adc_t >> 4) - t1) * ((adc_t >> 4) - t1)) >> 12) * i64::from(self.t3)) >> 14;
        let t_fine = var1 + var2;
        (((t_fine * 5 + 128) >> 8) as i32, t_fine as i32)
    }

    /// Pressure in Pa as Q24.8.  Returns 0 when the trim would divide by zero.
    pub fn compensate_pressure(&self, adc_p: i32, t_fine: i32) -> u32 {
        let mut var1 = i64::from(t_fine) - 128_000;
        let mut var2 = var1 * var1 * i64::from(self.p6);
        var2 += (var1 * i64::from(self.p5)) << 17;
        var2 += i64::from(self.p4) << 35;
        var1 = ((var1 * var1 * i64::from(self.p3)) >> 8) + ((var1 * i64::from(self.p2)) << 12);
        var1 = (((1i64 << 47) + var1) * i64::from(self.p1)) >> 33;
        if var1 == 0 {
            return 0;
        }
        let mut p = 1_048_576 - i64::from(adc_p);
        p = (((p << 31) - var2) * 3125) / var1;
        let var1 = (i64::from(self.p9) * (p >> 13) * (p >> 13)) >> 25;
        let var2 = (i64::from(self.p8) * p) >> 19;
        p = ((p + var1 + var2) >> 8) + (i64::from(self.p7) << 4);
        p.clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Relative humidity in %RH as Q22.10.
    pub fn compensate_humidity(&self, adc_h: i32, t_fine: i32) -> u32 {
        let v = i64::from(t_fine) - 76_800;
        let adc_h = i64::from(adc_h);
        let mut v = ((((adc_h << 14) - (i64::from(self.h4) << 20) - (i64::from(self.h5) * v))
            + 16_384)
            >> 15)
            * (((((((v * i64::from(self.h6)) >> 10)
                * (((v * i64::from(self.h3)) >> 11) + 32_768))
                >> 10)
                + 2_097_152)
                * i64::from(self.h2)
                + 8_192)
                >> 14);
        v -= ((((v >> 15) * (v >> 15)) >> 7) * i64::from(self.h1)) >> 4;
        (v.clamp(0, 419_430_400) >> 12) as u32
    }

    /// Compensate one raw 8-byte data burst (0xF7..0xFE).
    pub fn compensate(&self, raw: &[u8; 8]) -> EnvironmentReading {
        let adc_p = (i32::from(raw[0]) << 12) | (i32::from(raw[1]) << 4) | (i32::from(raw[2]) >> 4);
        let adc_t = (i32::from(raw[3]) << 12) | (i32::from(raw[4]) << 4) | (i32::from(raw[5]) >> 4);
        let adc_h = (i32::from(raw[6]) << 8) | i32::from(raw[7]);

        let (centi_c, t_fine) = self.compensate_temperature(adc_t);
        let pa_q8 = self.compensate_pressure(adc_p, t_fine);
        let rh_q10 = self.compensate_humidity(adc_h, t_fine);

        EnvironmentReading {
            temperature_c: centi_c as f32 / 100.0,
            humidity_pct: rh_q10 as f32 / 1024.0,
            pressure_kpa: pa_q8 as f32 / 256.0 / 1000.0,
        }
    }
}

pub struct Bme280<I2C> {
    i2c: I2C,
    address: u8,
    calibration: Option<Calibration>,
}

impl<I2C: I2c> Bme280<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: BME280_ADDR,
            calibration: None,
        }
    }

    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(self.address, &[reg], buf)
            .map_err(|_| SensorError::BusFault)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|_| SensorError::BusFault)
    }

    /// Check the chip id, load the trim and start normal-mode conversion.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        self.read_regs(REG_CHIP_ID, &mut id)?;
        if id[0] != CHIP_ID {
            return Err(SensorError::WrongChipId(id[0]));
        }

        let mut tp = [0u8; 24];
        self.read_regs(REG_CALIB_TP, &mut tp)?;
        let mut h1 = [0u8; 1];
        self.read_regs(REG_CALIB_H1, &mut h1)?;
        let mut h = [0u8; 7];
        self.read_regs(REG_CALIB_H2, &mut h)?;

        // ctrl_hum only latches on the following ctrl_meas write.
        self.write_reg(REG_CTRL_HUM, CTRL_HUM_X1)?;
        self.write_reg(REG_CTRL_MEAS, CTRL_MEAS_NORMAL_X1)?;

        self.calibration = Some(Calibration::parse(&tp, h1[0], &h));
        info!("BME280: normal mode, trim loaded");
        Ok(())
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }
}

impl<I2C: I2c> EnvironmentPort for Bme280<I2C> {
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError> {
        if self.calibration.is_none() {
            if let Err(e) = self.init() {
                warn!("BME280: init failed: {}", e);
                return Err(e);
            }
        }
        let Some(cal) = self.calibration else {
            return Err(SensorError::NotReady);
        };

        let mut raw = [0u8; 8];
        self.read_regs(REG_DATA, &mut raw)?;
        Ok(cal.compensate(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::test_bus::RegisterBus;

    /// Trim values from the Bosch BMP280 datasheet worked example.
    fn datasheet_trim() -> Calibration {
        Calibration {
            t1: 27504,
            t2: 26435,
            t3: -1000,
            p1: 36477,
            p2: -10685,
            p3: 3024,
            p4: 2855,
            p5: 140,
            p6: -7,
            p7: 15500,
            p8: -14600,
            p9: 6000,
            h1: 75,
            h2: 362,
            h3: 0,
            h4: 313,
            h5: 50,
            h6: 30,
        }
    }

    #[test]
    fn temperature_matches_datasheet_example() {
        let (centi, t_fine) = datasheet_trim().compensate_temperature(519_888);
        assert_eq!(centi, 2508);
        assert_eq!(t_fine, 128_422);
    }

    #[test]
    fn pressure_matches_datasheet_example() {
        let pa_q8 = datasheet_trim().compensate_pressure(415_148, 128_422);
        assert_eq!(pa_q8, 25_767_233);
        assert!((pa_q8 as f64 / 256.0 - 100_653.25).abs() < 0.01);
    }

    #[test]
    fn humidity_is_compensated_and_clamped() {
        let cal = datasheet_trim();
        assert_eq!(cal.compensate_humidity(30_000, 128_422), 56_317);
        assert_eq!(cal.compensate_humidity(0, 128_422), 0);
    }

    #[test]
    fn pressure_guard_against_zero_trim() {
        let cal = Calibration {
            p1: 0,
            ..datasheet_trim()
        };
        assert_eq!(cal.compensate_pressure(415_148, 128_422), 0);
    }

    #[test]
    fn parse_handles_split_humidity_nibbles() {
        let tp = [0u8; 24];
        // E4 = 0x12, E5 = 0x43, E6 = 0xFF
        let h = [0x6A, 0x01, 0x00, 0x12, 0x43, 0xFF, 0x1E];
        let cal = Calibration::parse(&tp, 75, &h);
        assert_eq!(cal.h2, 362);
        assert_eq!(cal.h4, 0x123);
        assert_eq!(cal.h5, -12);
        assert_eq!(cal.h6, 30);
    }

    #[test]
    fn reads_through_the_bus() {
        let mut bus = RegisterBus::new(BME280_ADDR);
        bus.regs[REG_CHIP_ID as usize] = CHIP_ID;
        let trim = datasheet_trim();
        let words: [u16; 12] = [
            trim.t1,
            trim.t2 as u16,
            trim.t3 as u16,
            trim.p1,
            trim.p2 as u16,
            trim.p3 as u16,
            trim.p4 as u16,
            trim.p5 as u16,
            trim.p6 as u16,
            trim.p7 as u16,
            trim.p8 as u16,
            trim.p9 as u16,
        ];
        for (i, w) in words.iter().enumerate() {
            let b = w.to_le_bytes();
            bus.regs[REG_CALIB_TP as usize + 2 * i] = b[0];
            bus.regs[REG_CALIB_TP as usize + 2 * i + 1] = b[1];
        }
        // adc_P = 415148, adc_T = 519888
        bus.regs[0xF7..0xFF].copy_from_slice(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x00, 0x00]);

        let mut bme = Bme280::new(bus);
        let reading = bme.read_environment().unwrap();
        assert!((reading.temperature_c - 25.08).abs() < 1e-4);
        assert!((reading.pressure_kpa - 100.653).abs() < 1e-3);
        assert!(reading.humidity_pct.abs() < f32::EPSILON);
        assert_eq!(
            bme.i2c.writes,
            vec![(REG_CTRL_HUM, CTRL_HUM_X1), (REG_CTRL_MEAS, CTRL_MEAS_NORMAL_X1)]
        );
    }

    #[test]
    fn wrong_chip_is_rejected() {
        let mut bus = RegisterBus::new(BME280_ADDR);
        bus.regs[REG_CHIP_ID as usize] = 0x58;
        let mut bme = Bme280::new(bus);
        assert_eq!(bme.read_environment(), Err(SensorError::WrongChipId(0x58)));
        assert!(bme.calibration().is_none());
    }
}
