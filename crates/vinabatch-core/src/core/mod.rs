//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Data Models** ([`models`]) - Jobs, job outcomes, scored poses and parameter rows
//! - **File Formats** ([`io`]) - Job config artifacts, result artifacts, ledger lines and CSV tables
//! - **Artifact Naming** ([`naming`]) - Run tags and output file names
//! - **Host Sizing** ([`resources`]) - Usable parallelism under scheduler and allocation limits

pub mod io;
pub mod models;
pub mod naming;
pub mod resources;
