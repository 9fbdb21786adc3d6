//! The relay orchestrator.
//!
//! `RelayService` composes the token client, chat client, and session
//! repository into the token-lifecycle and retry policy applied to every
//! inbound message.

pub mod service;

pub use service::RelayService;
