use super::config::BatchConfig;
use super::error::EngineError;
use crate::core::io::ledger_line::FAILURE_MARKER;
use crate::core::models::job::{Job, JobPaths, receptor_id_from_file_name};
use crate::core::models::params::{ParameterRow, ParameterTable, RejectedRow};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// An input entry that produced no jobs. Its `Display` form is the ledger note.
#[derive(Debug, Clone, PartialEq)]
pub enum SkippedEntry {
    MissingReceptor {
        candidate: PathBuf,
        extensions: Vec<String>,
    },
    RejectedRow(RejectedRow),
    DuplicateReceptor {
        receptor_id: String,
        table_id: String,
    },
    InvalidBoxSize {
        receptor_id: String,
        size: f64,
    },
}

impl fmt::Display for SkippedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReceptor {
                candidate,
                extensions,
            } => write!(
                f,
                "{} Missing receptor: {}({})",
                FAILURE_MARKER,
                candidate.display(),
                extensions.join("/")
            ),
            Self::RejectedRow(row) => write!(f, "{} Skipped: {}", FAILURE_MARKER, row),
            Self::DuplicateReceptor {
                receptor_id,
                table_id,
            } => write!(
                f,
                "{} Skipped receptor '{}': resolves to already scheduled receptor '{}'",
                FAILURE_MARKER, table_id, receptor_id
            ),
            Self::InvalidBoxSize { receptor_id, size } => write!(
                f,
                "{} Skipped receptor '{}': box size {} is not positive",
                FAILURE_MARKER, receptor_id, size
            ),
        }
    }
}

/// The jobs of one batch plus every entry that was skipped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct JobMatrix {
    pub jobs: Vec<Job>,
    pub skipped: Vec<SkippedEntry>,
}

/// Expands parameter rows x ligand files into jobs.
///
/// Jobs are ordered by parameter-table row, then by ligand file name. Each job's
/// directory `<results>/<receptor-id>/<ligand-id>/` is created before the job is
/// returned, so workers never create directories themselves.
pub struct JobMatrixBuilder<'a> {
    config: &'a BatchConfig,
}

impl<'a> JobMatrixBuilder<'a> {
    pub fn new(config: &'a BatchConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, name = "job_matrix", fields(results = %results_dir.display()))]
    pub fn build(&self, results_dir: &Path) -> Result<JobMatrix, EngineError> {
        let table = ParameterTable::load(&self.config.parameter_table)?;
        let ligands = self.list_ligands()?;
        info!(
            "Loaded {} parameter rows and {} ligands.",
            table.rows.len(),
            ligands.len()
        );

        let mut skipped: Vec<SkippedEntry> = table
            .rejected
            .into_iter()
            .map(SkippedEntry::RejectedRow)
            .collect();
        let mut scheduled = HashSet::new();
        let mut jobs = Vec::with_capacity(table.rows.len() * ligands.len());

        for row in &table.rows {
            let receptor_file = match self.resolve_receptor(&row.receptor) {
                Some(path) => path,
                None => {
                    skipped.push(SkippedEntry::MissingReceptor {
                        candidate: self.config.receptor_dir.join(&row.receptor),
                        extensions: self.config.receptor_extensions.clone(),
                    });
                    continue;
                }
            };
            let receptor_id = receptor_id_for(&receptor_file, &row.receptor);

            if !scheduled.insert(receptor_id.clone()) {
                skipped.push(SkippedEntry::DuplicateReceptor {
                    receptor_id,
                    table_id: row.receptor.clone(),
                });
                continue;
            }

            let box_size = row.size.unwrap_or(self.config.default_box_size);
            if !(box_size.is_finite() && box_size > 0.0) {
                skipped.push(SkippedEntry::InvalidBoxSize {
                    receptor_id,
                    size: box_size,
                });
                continue;
            }

            for (ligand_id, ligand_file) in &ligands {
                jobs.push(self.make_job(
                    results_dir,
                    row,
                    &receptor_id,
                    &receptor_file,
                    box_size,
                    ligand_id,
                    ligand_file,
                )?);
            }
        }

        for entry in &skipped {
            warn!("{}", entry);
        }

        if jobs.is_empty() {
            return Err(EngineError::NoJobs);
        }
        info!(
            jobs = jobs.len(),
            skipped = skipped.len(),
            "Job matrix prepared."
        );
        Ok(JobMatrix { jobs, skipped })
    }

    fn list_ligands(&self) -> Result<Vec<(String, PathBuf)>, EngineError> {
        let dir = &self.config.ligand_dir;
        let extension = self.config.ligand_extension.trim_start_matches('.');
        let entries = fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))?;

        let mut ligands = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| EngineError::io(dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if !stem.is_empty() => ligands.push((stem.to_string(), path.clone())),
                _ => warn!("Skipping ligand with unusable name: {}", path.display()),
            }
        }
        ligands.sort();

        if ligands.is_empty() {
            return Err(EngineError::NoLigands {
                dir: dir.clone(),
                extension: extension.to_string(),
            });
        }
        Ok(ligands)
    }

    /// Tries the identifier as given, then with each configured extension appended.
    fn resolve_receptor(&self, identifier: &str) -> Option<PathBuf> {
        let bare = self.config.receptor_dir.join(identifier);
        if bare.is_file() {
            return Some(bare);
        }
        self.config
            .receptor_extensions
            .iter()
            .map(|ext| self.config.receptor_dir.join(format!("{}{}", identifier, ext)))
            .find(|candidate| candidate.is_file())
    }

    #[allow(clippy::too_many_arguments)]
    fn make_job(
        &self,
        results_dir: &Path,
        row: &ParameterRow,
        receptor_id: &str,
        receptor_file: &Path,
        box_size: f64,
        ligand_id: &str,
        ligand_file: &Path,
    ) -> Result<Job, EngineError> {
        let job_dir = results_dir.join(receptor_id).join(ligand_id);
        fs::create_dir_all(&job_dir).map_err(|e| EngineError::io(&job_dir, e))?;
        debug!("Prepared job directory {}", job_dir.display());

        Ok(Job {
            receptor_id: receptor_id.to_string(),
            receptor_file: receptor_file.to_path_buf(),
            ligand_id: ligand_id.to_string(),
            ligand_file: ligand_file.to_path_buf(),
            center: row.center,
            box_size,
            num_modes: self.config.num_modes,
            paths: JobPaths::in_dir(&job_dir),
        })
    }
}

fn receptor_id_for(receptor_file: &Path, table_id: &str) -> String {
    receptor_file
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| receptor_id_from_file_name(name).to_string())
        .unwrap_or_else(|| table_id.to_string())
}
