//! The line grammar of the run ledger.
//!
//! Every completed job produces exactly one line:
//!
//! ```text
//! ✅ <ligand-id> → <receptor-file-name>
//! ❌ <ligand-id> vs <receptor-file-name>: <error text>
//! ```
//!
//! Ledger-driven parsing recovers `(receptor, ligand)` pairs from success lines alone, so
//! the success form must stay stable. `->` is accepted in place of `→` when reading.
//! The ligand id ends at the first arrow; everything after it, trimmed, is the receptor
//! file name.
//! Any other line (failure lines, skip notes, report headers) is ignored by the reader.

use crate::core::models::job::receptor_id_from_file_name;
use crate::core::models::outcome::JobOutcome;
use regex::Regex;
use std::sync::LazyLock;

pub const SUCCESS_MARKER: &str = "✅";
pub const FAILURE_MARKER: &str = "❌";
pub const ARROW: &str = "→";
pub const ASCII_ARROW: &str = "->";

static SUCCESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*✅\s*(.+?)\s*(?:→|->)\s*(\S.*?)\s*$")
        .expect("ledger success pattern is valid")
});

/// A `(receptor, ligand)` pair recovered from a ledger success line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub ligand_id: String,
    pub receptor_file_name: String,
}

impl LedgerEntry {
    pub fn receptor_id(&self) -> &str {
        receptor_id_from_file_name(&self.receptor_file_name)
    }
}

/// Renders an outcome as a single ledger line (no trailing newline).
pub fn format_outcome(outcome: &JobOutcome) -> String {
    if outcome.success {
        format!(
            "{} {} {} {}",
            SUCCESS_MARKER, outcome.ligand_id, ARROW, outcome.receptor_file_name
        )
    } else {
        format!(
            "{} {} vs {}: {}",
            FAILURE_MARKER,
            outcome.ligand_id,
            outcome.receptor_file_name,
            fold_lines(&outcome.message)
        )
    }
}

/// Renders a free-text note, folded onto one line.
pub fn format_note(text: &str) -> String {
    fold_lines(text)
}

pub fn parse_success_line(line: &str) -> Option<LedgerEntry> {
    let caps = SUCCESS_LINE.captures(line)?;
    Some(LedgerEntry {
        ligand_id: caps[1].to_string(),
        receptor_file_name: caps[2].to_string(),
    })
}

/// True for lines that look like they were meant as success lines but do not parse.
pub fn is_suspect_line(line: &str) -> bool {
    (line.contains(ARROW) || line.contains(ASCII_ARROW))
        && !line.trim_start().starts_with(FAILURE_MARKER)
        && parse_success_line(line).is_none()
}

fn fold_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}
