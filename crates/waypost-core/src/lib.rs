//! Relay orchestration and collaborator trait definitions for Waypost.
//!
//! This crate defines the "ports" (token client, chat client, session
//! repository, messenger) that the infrastructure layer implements, plus
//! the business logic that composes them: the relay orchestrator, the
//! token-expiry evaluator, and the reply renderer. It depends only on
//! `waypost-types` -- never on `waypost-infra` or any network/database crate.

pub mod chat;
pub mod format;
pub mod relay;
pub mod session;
pub mod token;
pub mod transport;
