use tracing::{Level, Span};

use super::TraceId;

/// Root span for one refresh cycle. Everything logged while the cycle runs
/// carries the same `trace_id`.
pub fn cycle_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::span!(
        Level::INFO,
        "cycle",
        name = %name,
        trace_id = %trace_id
    )
}

/// Child span, inherits trace_id from the enclosing cycle span.
pub fn child_span(name: &'static str) -> Span {
    tracing::span!(Level::DEBUG, "step", name = %name)
}
