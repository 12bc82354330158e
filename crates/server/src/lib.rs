//! HTTP and WebSocket surface for the turn queue service.
//!
//! Exposed as a library so integration tests can build the router in-process
//! instead of spawning the binary.

pub mod api;
pub mod metrics;
pub mod state;
