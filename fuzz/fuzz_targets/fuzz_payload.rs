//! Fuzz target: `TelemetryPayload::compose` / `to_json`
//!
//! Builds statuses and environment readings from arbitrary bit patterns
//! (NaN, infinities and huge values included) and asserts that encoding
//! never fails and never panics.
//!
//! cargo fuzz run fuzz_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use herdtag::app::events::StatusMessage;
use herdtag::fix::PositionFix;
use herdtag::fsm::DeviceState;
use herdtag::payload::TelemetryPayload;
use herdtag::sensors::EnvironmentReading;

fn f64_at(data: &[u8], i: usize) -> f64 {
    let mut b = [0u8; 8];
    for (k, slot) in b.iter_mut().enumerate() {
        *slot = data.get(i + k).copied().unwrap_or(0);
    }
    f64::from_bits(u64::from_le_bytes(b))
}

fuzz_target!(|data: &[u8]| {
    let mut status = StatusMessage::from_fix(
        &PositionFix::at(f64_at(data, 0), f64_at(data, 8)),
        DeviceState::Tracking,
    );
    status.total_dwell_secs = f64_at(data, 16);
    status.posture.pitch_deg = f64_at(data, 24) as f32;

    let env = EnvironmentReading {
        temperature_c: f64_at(data, 32) as f32,
        humidity_pct: f64_at(data, 40) as f32,
        pressure_kpa: 100.0,
    };

    let payload = TelemetryPayload::compose(Some(&status), data.first() == Some(&1), Some(&env));
    let json = payload.to_json().expect("integer payload always encodes");
    assert!(json.starts_with(b"{\"water_flag\":"));
});
