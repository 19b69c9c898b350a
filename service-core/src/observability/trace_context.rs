//! W3C Trace Context propagation for outbound HTTP calls.
//!
//! Calls to the completion and storage APIs carry the current span's
//! `traceparent` (and `tracestate`, when non-empty) so upstream logs can be
//! correlated with ours. See <https://www.w3.org/TR/trace-context/>.

use opentelemetry::trace::TraceContextExt;
use reqwest::header::HeaderMap;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Write the current span's context into `headers`.
///
/// Leaves `headers` untouched when there is no valid span context, e.g. when
/// no OTLP layer is installed.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();

    if !span_context.is_valid() {
        return;
    }

    // version-trace_id-span_id-flags, version fixed at 00
    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = traceparent.parse() {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let tracestate = span_context.trace_state().header();
    if !tracestate.is_empty()
        && let Ok(value) = tracestate.parse()
    {
        headers.insert(TRACESTATE_HEADER, value);
    }
}

/// Adds trace headers to a request before it is sent.
pub trait TracedClientExt {
    fn with_trace_context(self) -> Self;
}

impl TracedClientExt for reqwest::RequestBuilder {
    fn with_trace_context(self) -> Self {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        self.headers(headers)
    }
}
