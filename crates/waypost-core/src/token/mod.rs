//! Access-token acquisition and expiry evaluation.
//!
//! - `TokenClient`: RPITIT trait for the external token authority
//! - `expiry`: local, network-free expiry check with a safety window

pub mod client;
pub mod expiry;
