//! Infrastructure layer for relayforge.
//!
//! Contains implementations of the ports defined in `relayforge-core`:
//! SQLite build storage, the gateway-backed customizer, the command-line
//! shellcode converter, plus configuration and data directory helpers.

pub mod config;
pub mod customizer;
pub mod filesystem;
pub mod shellcode;
pub mod sqlite;
