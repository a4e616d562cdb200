//! Test utilities for the fanjoin workspace.
//!
//! This crate provides instrumentation used by the engine's test suite:
//! - Concurrency probing for verifying bounding invariants
//! - Latency schedules for decorrelating completion order from spawn order
//!
//! # Usage
//!
//! This crate is intended for use within the fanjoin test suite and is not
//! published as part of the public API.

pub mod latency;
pub mod probe;
