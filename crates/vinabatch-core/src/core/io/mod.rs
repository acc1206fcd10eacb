//! Reading and writing the text artifacts exchanged with the docking program and
//! produced for downstream analysis.

pub mod config_file;
pub mod ledger_line;
pub mod parse_log;
pub mod result_file;
pub mod table;
