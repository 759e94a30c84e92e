//! Observability: structured logging and request tracing.

mod logging;
mod middleware;

pub use logging::{default_filter, init_logging, LogFormat};
pub use middleware::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
