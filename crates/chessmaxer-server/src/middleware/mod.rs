//! Middleware for the analysis server.

mod timing;

pub use timing::{timing_layer, SLOW_REQUEST_MS};
