//! Shared domain types for relayforge.
//!
//! This crate contains the domain types used across the relay build service:
//! gateway and relay build records, channels, build requests, identifiers,
//! configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod build;
pub mod channel;
pub mod config;
pub mod error;
pub mod id;
