/*!
 * Monitoring
 * Outbound events, event sinks, structured tracing and the sampling task
 */

pub mod events;
pub mod sink;
pub mod streaming;
pub mod task;
pub mod tracer;

pub use events::{EventFilter, EventKind, MonitorEvent, Severity};
pub use sink::{EventSink, NullSink, TracingSink};
pub use streaming::{EventStream, StreamStats, Subscriber};
pub use task::{weak_handler, SamplingCommand, SamplingTask, TickHandler};
pub use tracer::{init_tracing, span_operation, MonitorSpan};
