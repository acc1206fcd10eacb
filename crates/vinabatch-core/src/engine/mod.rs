//! # Engine Module
//!
//! The stateful machinery behind a docking campaign: building the job matrix, running
//! jobs on a bounded worker pool, keeping the run ledger, and discovering and parsing
//! results.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated settings for a docking batch and a parse run
//! - **Job Matrix** ([`matrix`]) - Expands receptors x ligands into isolated jobs
//! - **Execution** ([`executor`]) - Runs jobs as single-threaded child processes on a bounded pool
//! - **Run Ledger** ([`ledger`]) - Append-only, flushed-per-line record of job outcomes
//! - **Discovery** ([`discovery`]) - Finds result artifacts by crawling or by replaying a ledger
//! - **Result Parsing** ([`parser`]) - Concurrent score extraction with live output
//! - **Progress Monitoring** ([`progress`]) - Callback hooks for user feedback
//! - **Error Handling** ([`error`]) - Engine-level error type
//!
//! Execution and parsing are two independent bounded-parallelism phases. Both drain
//! completions in arbitrary order; the only global ordering is imposed by the final
//! result sort.

pub mod config;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod matrix;
pub mod parser;
pub mod progress;
