//! HerdTag Firmware: main entry point
//!
//! Hexagonal architecture with three blocking consumer loops.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ReceiverLink      RgIndicator     Bno055 / Bme280             │
//! │  (PVT + restart)   (IndicatorPort) (Orientation/Environment)   │
//! │  LogEventSink      LogPublisher    MonotonicClock              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  tracker thread : EVENTS ─▶ TrackerService ─▶ STATUS_QUEUE     │
//! │  sensor thread  : SensorService ─▶ READINGS                    │
//! │  main thread    : RECEIVER + ARM_BUTTON ─▶ EVENTS              │
//! │                   STATUS_QUEUE + READINGS ─▶ TelemetryPublisher│
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The modem glue must feed PVT solutions through `RECEIVER.on_pvt` and
//! poll `RECEIVER.take_restart_request`, restarting the receiver when it
//! returns `true`.  A latch nobody takes makes every later restart fail
//! with `RestartPending`.
//!
//! Interrupt and callback context only stage or latch.  The main loop
//! forwards onto `EVENTS` so the tracker thread is always woken from a
//! task.
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use herdtag::adapters::hardware::HardwareAdapter;
use herdtag::adapters::log_sink::{LogEventSink, LogPublisher};
use herdtag::adapters::receiver::RECEIVER;
use herdtag::adapters::time::MonotonicClock;
use herdtag::app::publisher::TelemetryPublisher;
use herdtag::app::sensor_service::SensorService;
use herdtag::app::service::TrackerService;
use herdtag::app::status_queue::STATUS_QUEUE;
use herdtag::config::SystemConfig;
use herdtag::drivers::button::ARM_BUTTON;
use herdtag::drivers::hw_init;
use herdtag::drivers::indicator::RgIndicator;
use herdtag::events::EVENTS;
use herdtag::pins;
use herdtag::sensors::{Bme280, Bno055, READINGS};

const INPUT_POLL_MS: u32 = 20;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HerdTag v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config (compiled-in defaults) ──────────────────────
    let config = SystemConfig::default();
    if let Err(e) = config.validate() {
        error!("Config rejected: {}", e);
        return Err(anyhow::anyhow!("invalid configuration: {e}"));
    }

    // ── 3. Peripherals ────────────────────────────────────────
    let p = Peripherals::take()?;
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ));

    // BNO055 on I2C0 with a switched supply.
    let imu_bus = I2cDriver::new(p.i2c0, p.pins.gpio8, p.pins.gpio9, &i2c_cfg)?;
    let imu_power = PinDriver::output(p.pins.gpio10)?;
    let mut imu = Bno055::new(imu_bus, imu_power, FreeRtos);

    // BME280 on I2C1.
    let env_bus = I2cDriver::new(p.i2c1, p.pins.gpio4, p.pins.gpio5, &i2c_cfg)?;
    let mut env = Bme280::new(env_bus);

    let led = RgIndicator::new(
        PinDriver::output(p.pins.gpio11)?,
        PinDriver::output(p.pins.gpio12)?,
    );
    let mut hw = HardwareAdapter::new(&RECEIVER, led);

    ARM_BUTTON.set_debounce_ms(config.arm_debounce_ms);
    if let Err(e) = hw_init::init_button_isr(pins::ARM_BUTTON_GPIO) {
        // Without the button the anchor can never be armed, but position
        // reporting still works.
        error!("Arm button unavailable: {}", e);
    }

    // ── 4. Tracker loop ───────────────────────────────────────
    let tracker_cfg = config.clone();
    std::thread::Builder::new()
        .name("tracker".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            let clock = MonotonicClock::new();
            let mut sink = LogEventSink::new(tracker_cfg.utc_offset_hours);
            let mut tracker = TrackerService::new(tracker_cfg);
            tracker.start(&mut hw, &mut sink);

            loop {
                let event = EVENTS.wait_blocking();
                if let Some(status) =
                    tracker.handle(event, clock.uptime_ms(), &READINGS, &mut hw, &mut sink)
                {
                    STATUS_QUEUE.push_reporting(status, &mut sink);
                }
            }
        })?;

    // ── 5. Sensor loop ────────────────────────────────────────
    let sensor_cfg = config.clone();
    std::thread::Builder::new()
        .name("sensors".into())
        .stack_size(6 * 1024)
        .spawn(move || {
            let mut sink = LogEventSink::new(sensor_cfg.utc_offset_hours);
            let mut sensors = SensorService::new(&sensor_cfg);
            if let Err(e) = sensors.start(&mut imu, &mut sink) {
                warn!("Sensor loop: {} (environment only)", e);
            }

            let step = sensor_cfg.orientation_sample_interval_ms;
            loop {
                std::thread::sleep(Duration::from_millis(u64::from(step)));
                sensors.tick(step, &mut imu, &mut env, &READINGS, &mut sink);
            }
        })?;

    // ── 6. Input forwarding + publisher loop (main thread) ────
    let mut publisher = TelemetryPublisher::new(&config);
    let mut uplink = LogPublisher::new();
    info!("System ready. Publishing to '{}'.", publisher.topic());

    loop {
        std::thread::sleep(Duration::from_millis(u64::from(INPUT_POLL_MS)));
        RECEIVER.forward(&EVENTS);
        ARM_BUTTON.forward(&EVENTS);
        // Failures are logged by the publisher and retried next interval.
        let _ = publisher.tick(INPUT_POLL_MS, &STATUS_QUEUE, &READINGS, &mut uplink);
    }
}
