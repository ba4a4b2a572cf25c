//! Relay build pipeline: collaborator ports, naming, derivation, and the
//! customization service that ties them together.

pub mod customizer;
pub mod derive;
pub mod format;
pub mod service;
pub mod shellcode;
