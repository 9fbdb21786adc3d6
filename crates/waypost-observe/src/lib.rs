//! Observability setup for Waypost.

pub mod tracing_setup;
