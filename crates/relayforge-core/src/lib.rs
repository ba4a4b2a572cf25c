//! Business logic and repository trait definitions for relayforge.
//!
//! This crate defines the "ports" (repository and collaborator traits) that
//! the infrastructure layer implements. It depends only on
//! `relayforge-types` -- never on `relayforge-infra` or any database/IO crate.

pub mod relay;
pub mod repository;
