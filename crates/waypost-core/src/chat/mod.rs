//! AI chat backend abstraction.

pub mod client;
