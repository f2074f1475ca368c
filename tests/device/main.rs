//! Device Integration Tests
//!
//! Multi-value set requests, serialization of the whole device and
//! configuration from `catena.toml`.

#[path = "../common/mod.rs"]
mod common;

mod config;
mod multi_set;
mod serialization;
