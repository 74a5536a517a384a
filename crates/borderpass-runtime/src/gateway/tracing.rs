use axum::extract::Request;
use axum::http::header::HeaderName;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// Header name for trace ID.
pub const TRACE_ID_HEADER: &str = "x-trace-id";
/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request tracing state.
#[derive(Debug, Clone)]
pub struct TracingState {
    /// Trace ID, propagated from the caller when present.
    pub trace_id: String,
    /// Unique request ID.
    pub request_id: String,
    /// When the request started.
    pub start_time: std::time::Instant,
}

impl TracingState {
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4().to_string())
    }

    /// Create with an existing trace ID (for propagation).
    pub fn with_trace_id(trace_id: String) -> Self {
        Self {
            trace_id,
            request_id: Uuid::new_v4().to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get elapsed time since request start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for TracingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach a `TracingState` to the request and echo its ids on the response.
pub async fn tracing_middleware(req: Request, next: Next) -> Response {
    let trace_id = req
        .headers()
        .get(HeaderName::from_static(TRACE_ID_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let tracing_state = TracingState::with_trace_id(trace_id);
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut req = req;
    req.extensions_mut().insert(tracing_state.clone());

    let mut response = next.run(req).await;

    tracing::debug!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        request_id = %tracing_state.request_id,
        elapsed_ms = tracing_state.elapsed().as_millis() as u64,
        "Request completed"
    );

    if let Ok(val) = tracing_state.trace_id.parse() {
        response.headers_mut().insert(TRACE_ID_HEADER, val);
    }
    if let Ok(val) = tracing_state.request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}
