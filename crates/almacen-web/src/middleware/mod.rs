//! Middleware for request processing

pub mod logging;
