//! # vinabatch Core Library
//!
//! Batch execution and result aggregation for large molecular docking campaigns
//! driven by an external docking program (AutoDock Vina or anything that speaks its
//! config-file interface).
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Job`, `JobOutcome`,
//!   `PoseRecord`), the on-disk formats the pipeline reads and writes (job config
//!   artifacts, result artifacts, ledger lines, CSV tables) and host resource sizing.
//!
//! - **[`engine`]: The Logic Core.** The stateful machinery of a run: expanding inputs
//!   into a job matrix, executing jobs on a bounded worker pool, the append-only run
//!   ledger, result discovery and concurrent result parsing.
//!
//! - **[`workflows`]: The Public API.** Complete procedures (`dock` and `parse`) that
//!   tie `engine` and `core` together and produce the durable run artifacts.

pub mod core;
pub mod engine;
pub mod workflows;
