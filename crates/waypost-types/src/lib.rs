//! Shared domain types for Waypost.
//!
//! This crate has no I/O and no async code: it defines the data shapes
//! (sessions, AI answer payloads, configuration) and error enums that the
//! other workspace crates exchange.

pub mod answer;
pub mod config;
pub mod error;
pub mod session;
