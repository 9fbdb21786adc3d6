//! HTTP clients for the three external services.
//!
//! Each module pairs a reqwest-backed live client with a deterministic
//! fixture, unified behind an `Any*` enum chosen once at construction
//! from [`waypost_types::config::ClientMode`].

pub mod chat;
pub mod messenger;
pub mod token;
