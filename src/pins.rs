//! GPIO / peripheral pin assignments for the HerdTag collar board.
//!
//! Single source of truth; every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Orientation sensor (BNO055) on I2C0
// ---------------------------------------------------------------------------

pub const IMU_I2C_SDA_GPIO: i32 = 8;
pub const IMU_I2C_SCL_GPIO: i32 = 9;
/// High-side switch for the BNO055 supply.  HIGH = powered.
pub const IMU_POWER_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// Environment sensor (BME280) on I2C1
// ---------------------------------------------------------------------------

pub const ENV_I2C_SDA_GPIO: i32 = 4;
pub const ENV_I2C_SCL_GPIO: i32 = 5;

/// Both buses run in fast mode.
pub const I2C_BAUDRATE_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Status indicator (discrete red + green LEDs, active HIGH)
// ---------------------------------------------------------------------------

pub const LED_RED_GPIO: i32 = 11;
pub const LED_GREEN_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Anchor-arm button (active-low with pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button pressed at the trough to arm the geofence.
pub const ARM_BUTTON_GPIO: i32 = 16;
