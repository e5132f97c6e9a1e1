//! I/O collaborators for casefile commands: configuration, storage, seed data.

pub mod config;
pub mod seed;
pub mod store;
