//! Group partitioning and reconciliation engine for the match operator console.
//!
//! This crate implements the logic behind splitting a selected set of entrants
//! into labeled groups, each supervised by exactly one overseer, before the
//! partition is persisted to the backend. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (partition strategies, the group
//!   store, overseer assignment, invariants). No I/O, fully testable in
//!   isolation.
//! - **[`io`]**: Side-effecting operations (the remote group gateway,
//!   configuration files). Isolated behind traits to enable scripted fakes in
//!   tests.
//!
//! Orchestration modules ([`edit`], [`reconcile`], [`commit`]) coordinate core
//! logic with the gateway: operator edits mutate the store under a write
//! lease, background snapshots are reconciled against that lease, and a
//! finalized partition is committed atomically.

pub mod commit;
pub mod core;
pub mod edit;
pub mod io;
pub mod logging;
pub mod reconcile;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
