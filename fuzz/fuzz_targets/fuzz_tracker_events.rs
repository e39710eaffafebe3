//! Fuzz target: `TrackerService::handle`
//!
//! Decodes arbitrary bytes into a stream of fixes, invalid reports and
//! arm requests and asserts that the tracker never panics, only walks
//! legal edges, and yields one status per fix.
//!
//! cargo fuzz run fuzz_tracker_events

#![no_main]

use libfuzzer_sys::fuzz_target;
use herdtag::app::events::AppEvent;
use herdtag::app::ports::{EventSink, IndicatorPort, ReceiverPort};
use herdtag::app::service::TrackerService;
use herdtag::config::SystemConfig;
use herdtag::error::ReceiverError;
use herdtag::events::Event;
use herdtag::fix::PositionFix;
use herdtag::fsm::context::IndicatorColour;
use herdtag::sensors::SharedReadings;

struct Null;

impl ReceiverPort for Null {
    fn restart_receiver(&mut self) -> Result<(), ReceiverError> {
        Err(ReceiverError::RestartFailed)
    }
}

impl IndicatorPort for Null {
    fn set_indicator(&mut self, _colour: IndicatorColour) {}
}

impl EventSink for Null {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut tracker = TrackerService::new(SystemConfig::default());
    let readings = SharedReadings::new();
    let (mut hw, mut sink) = (Null, Null);
    tracker.start(&mut hw, &mut sink);

    let mut now_ms = 0u64;
    for chunk in data.chunks(3) {
        let event = match chunk {
            [0, ..] => Event::ArmAnchor,
            [tag, lat, lon] if tag % 2 == 1 => Event::Fix(PositionFix::at(
                40.0 + f64::from(*lat as i8) * 1e-5,
                -75.0 + f64::from(*lon as i8) * 1e-5,
            )),
            _ => Event::Fix(PositionFix::invalid()),
        };
        now_ms += 1000;

        let before = tracker.state();
        let status = tracker.handle(event, now_ms, &readings, &mut hw, &mut sink);
        let after = tracker.state();

        assert!(before == after || before.can_transition_to(after));
        assert_eq!(status.is_some(), matches!(event, Event::Fix(_)));
    }
});
