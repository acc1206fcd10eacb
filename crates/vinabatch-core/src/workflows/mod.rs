//! # Workflows Module
//!
//! End-to-end entry points tying the engine and core layers together.
//!
//! - **Docking Workflow** ([`dock`]) - Builds the job matrix, runs it on a sized worker
//!   pool, and writes the run ledger plus the duration and summary reports.
//! - **Parse Workflow** ([`parse`]) - Discovers result artifacts by crawl or ledger
//!   replay, parses them concurrently and writes the live and sorted tables.
//!
//! The two workflows never overlap: a parse run reads only what a finished (or
//! interrupted) docking run left on disk.

pub mod dock;
pub mod parse;
