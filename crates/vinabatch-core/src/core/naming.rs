use chrono::{DateTime, Local};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Timestamp format embedded in artifact names.
pub const TAG_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

static COMPOUND_LIGAND_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Ligands_CPD(\d+)_Ligands").expect("ligand directory pattern is valid")
});

/// Keeps `[A-Za-z0-9._-]`, replaces everything else with `_` and trims outer `_`.
pub fn sanitize_tag(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match mapped.trim_matches('_') {
        "" => "X".to_string(),
        tag => tag.to_string(),
    }
}

pub fn receptor_tag(receptor_dir: &Path) -> String {
    let base = dir_name(receptor_dir).unwrap_or_else(|| "Receptors".to_string());
    let base = base.strip_prefix("Receptors_").unwrap_or(&base);
    sanitize_tag(if base.is_empty() { "Receptors" } else { base })
}

/// `Ligands_CPD12_Ligands...` becomes `CPD12`; any other name is sanitized as is.
pub fn ligand_tag(ligand_dir: &Path) -> String {
    let base = dir_name(ligand_dir).unwrap_or_else(|| "Ligands".to_string());
    match COMPOUND_LIGAND_DIR.captures(&base) {
        Some(caps) => format!("CPD{}", &caps[1]),
        None => sanitize_tag(&base),
    }
}

pub fn timestamp_tag(at: &DateTime<Local>) -> String {
    at.format(TAG_TIME_FORMAT).to_string()
}

fn dir_name(dir: &Path) -> Option<String> {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Names every artifact of one docking run:
/// `<receptorTag>_<ligandTag>_<N>Poses_<timestamp>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTag(String);

impl RunTag {
    pub fn new(receptor_dir: &Path, ligand_dir: &Path, num_modes: u32, at: &DateTime<Local>) -> Self {
        Self(format!(
            "{}_{}_{}Poses_{}",
            receptor_tag(receptor_dir),
            ligand_tag(ligand_dir),
            num_modes,
            timestamp_tag(at)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn results_dir(&self, root: &Path) -> PathBuf {
        root.join(format!("Docking_Results_{}", self.0))
    }

    pub fn ledger(&self, root: &Path) -> PathBuf {
        root.join(format!("run_log_{}.txt", self.0))
    }

    pub fn duration_report(&self, root: &Path) -> PathBuf {
        root.join(format!("job_duration_{}.txt", self.0))
    }

    pub fn summary_report(&self, root: &Path) -> PathBuf {
        root.join(format!("docking_summary_{}.txt", self.0))
    }
}

/// Output names of one parse run, all sharing `<root-name>_ALL_<timestamp>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutputs {
    pub final_table: PathBuf,
    pub live_table: PathBuf,
    pub progress_log: PathBuf,
}

impl ParseOutputs {
    pub fn new(out_dir: &Path, results_root: &Path, at: &DateTime<Local>) -> Self {
        let root_name = dir_name(results_root).unwrap_or_else(|| "results".to_string());
        let base = format!("{}_ALL_{}", root_name, timestamp_tag(at));
        Self {
            final_table: out_dir.join(format!("{}_vina_docking_scores_sorted.csv", base)),
            live_table: out_dir.join(format!("{}_LIVE.csv", base)),
            progress_log: out_dir.join(format!("{}_parse_progress.log", base)),
        }
    }
}
