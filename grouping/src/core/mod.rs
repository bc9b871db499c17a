//! Deterministic, pure logic shared by the partitioning engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod error;
pub mod invariants;
pub mod overseers;
pub mod store;
pub mod strategy;
pub mod types;
