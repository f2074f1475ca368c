//! Param Integration Tests
//!
//! Exercises the value model through the type-erased `Param` interface:
//! wire round trips, path resolution, authorization and length budgets.

#[path = "../common/mod.rs"]
mod common;

mod lengths;
mod paths;
mod round_trip;
mod variants;
