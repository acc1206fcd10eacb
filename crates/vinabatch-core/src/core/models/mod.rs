//! Data models for docking jobs and their results.
//!
//! A [`job::Job`] is produced once by the job matrix and consumed once by the execution
//! engine, which turns it into an [`outcome::JobOutcome`]. Result parsing later produces
//! one [`pose::PoseRecord`] per scored pose found in a job's result artifact.

pub mod job;
pub mod outcome;
pub mod params;
pub mod pose;
