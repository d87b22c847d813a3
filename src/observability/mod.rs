//! Observability: logging, metrics and the structured game event stream.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter, timestamp_at};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
