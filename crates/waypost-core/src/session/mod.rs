//! Session persistence abstractions.
//!
//! This module defines the `SessionRepository` trait that the
//! infrastructure layer implements for per-identity session storage.

pub mod repository;
