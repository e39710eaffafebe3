//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                 | Connects to                 |
//! |-------------|----------------------------|-----------------------------|
//! | `hardware`  | ReceiverPort, IndicatorPort| receiver link + status LED  |
//! | `log_sink`  | EventSink                  | Serial log output           |
//! |             | PublishPort                | Serial log (bench uplink)   |
//! | `receiver`  | ReceiverPort               | modem glue (PVT + restart)  |
//! | `time`      | -                          | monotonic system timer      |

pub mod hardware;
pub mod log_sink;
pub mod receiver;
pub mod time;
