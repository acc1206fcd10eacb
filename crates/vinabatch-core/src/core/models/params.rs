use super::job::GridCenter;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Columns the parameter table must declare in its header.
pub const REQUIRED_COLUMNS: [&str; 4] = ["PDB_ID", "X", "Y", "Z"];

/// One receptor's docking box, keyed by receptor identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub receptor: String,
    pub center: GridCenter,
    pub size: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawParameterRow {
    #[serde(rename = "PDB_ID")]
    pdb_id: String,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Z")]
    z: f64,
    #[serde(rename = "SIZE", default)]
    size: Option<f64>,
}

/// A table row that could not be turned into a [`ParameterRow`].
///
/// Rejected rows are reported and skipped; they never abort the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectedRow {
    Malformed { line: u64, reason: String },
    EmptyIdentifier { line: u64 },
    Duplicate { line: u64, receptor: String },
}

impl fmt::Display for RejectedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { line, reason } => {
                write!(f, "parameter row {} is malformed: {}", line, reason)
            }
            Self::EmptyIdentifier { line } => {
                write!(f, "parameter row {} has an empty PDB_ID", line)
            }
            Self::Duplicate { line, receptor } => write!(
                f,
                "parameter row {} repeats receptor '{}'; keeping the first row",
                line, receptor
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    pub rows: Vec<ParameterRow>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Parameter table '{path}' is missing required column(s): {}", missing.join(", "))]
    MissingColumns { path: String, missing: Vec<String> },
}

impl ParameterTable {
    /// Loads a comma-separated parameter table with a `PDB_ID,X,Y,Z[,SIZE]` header.
    ///
    /// Missing required headers are fatal. Individual bad rows, blank identifiers and
    /// repeated identifiers are collected in [`ParameterTable::rejected`] instead.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let path_str = path.to_string_lossy().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| TableError::Csv {
                path: path_str.clone(),
                source: e,
            })?;

        let headers = reader
            .headers()
            .map_err(|e| TableError::Csv {
                path: path_str.clone(),
                source: e,
            })?
            .clone();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TableError::MissingColumns {
                path: path_str,
                missing,
            });
        }

        let mut table = ParameterTable::default();
        let mut seen = HashSet::new();

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    table.rejected.push(RejectedRow::Malformed {
                        line,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let raw: RawParameterRow = match record.deserialize(Some(&headers)) {
                Ok(raw) => raw,
                Err(e) => {
                    table.rejected.push(RejectedRow::Malformed {
                        line,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if raw.pdb_id.is_empty() {
                table.rejected.push(RejectedRow::EmptyIdentifier { line });
                continue;
            }
            if !seen.insert(raw.pdb_id.clone()) {
                table.rejected.push(RejectedRow::Duplicate {
                    line,
                    receptor: raw.pdb_id,
                });
                continue;
            }

            table.rows.push(ParameterRow {
                receptor: raw.pdb_id,
                center: GridCenter {
                    x: raw.x,
                    y: raw.y,
                    z: raw.z,
                },
                size: raw.size,
            });
        }

        Ok(table)
    }
}
