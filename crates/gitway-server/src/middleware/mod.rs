//! Request-scoped middleware for the HTTP surface.

mod request_log;

pub use request_log::{REQUEST_ID_HEADER, request_log_middleware};
