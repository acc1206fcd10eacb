use std::path::{Path, PathBuf};

/// File name of the docking program's result artifact inside a job directory.
pub const RESULT_FILE_NAME: &str = "out.pdbqt";
/// File name of the captured stdout/stderr of a job.
pub const LOG_FILE_NAME: &str = "log.txt";
/// File name of the serialized job configuration.
pub const CONFIG_FILE_NAME: &str = "config.txt";

/// Structure-file extensions tried, in order, when a receptor identifier has none.
///
/// `.pdbqt` must stay ahead of `.pdb` so identifier stripping removes the longest match.
pub const RECEPTOR_EXTENSIONS: [&str; 3] = [".pdbqt", ".pdb", ".mol2"];

/// Strips a known structure-file extension from a receptor file name.
///
/// This is the single mapping from "receptor file name" to "receptor identifier" used
/// both when laying out job directories and when replaying a run ledger, so the two
/// always agree on the directory a receptor's results live in.
pub fn receptor_id_from_file_name(file_name: &str) -> &str {
    RECEPTOR_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCenter {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The three artifacts a job owns inside `<results>/<receptor>/<ligand>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub config: PathBuf,
    pub output: PathBuf,
    pub log: PathBuf,
}

impl JobPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.join(CONFIG_FILE_NAME),
            output: dir.join(RESULT_FILE_NAME),
            log: dir.join(LOG_FILE_NAME),
        }
    }

    pub fn job_dir(&self) -> Option<&Path> {
        self.output.parent()
    }
}

/// One receptor x ligand docking trial.
///
/// Jobs are only created by the job matrix, which guarantees that the receptor and
/// ligand files existed at construction time and that the job directory was created.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub receptor_id: String,
    pub receptor_file: PathBuf,
    pub ligand_id: String,
    pub ligand_file: PathBuf,
    pub center: GridCenter,
    pub box_size: f64,
    pub num_modes: u32,
    pub paths: JobPaths,
}

impl Job {
    /// The receptor's file name as written to the run ledger, e.g. `1abc.pdbqt`.
    pub fn receptor_file_name(&self) -> String {
        self.receptor_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.receptor_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receptor_id_strips_known_extensions() {
        assert_eq!(receptor_id_from_file_name("1abc.pdbqt"), "1abc");
        assert_eq!(receptor_id_from_file_name("1abc.pdb"), "1abc");
        assert_eq!(receptor_id_from_file_name("1abc.mol2"), "1abc");
    }

    #[test]
    fn receptor_id_keeps_unknown_extensions_and_bare_names() {
        assert_eq!(receptor_id_from_file_name("1abc"), "1abc");
        assert_eq!(receptor_id_from_file_name("1abc.cif"), "1abc.cif");
        assert_eq!(receptor_id_from_file_name(".pdbqt"), ".pdbqt");
    }

    #[test]
    fn job_paths_follow_fixed_layout() {
        let paths = JobPaths::in_dir(Path::new("/r/R1/L1"));
        assert_eq!(paths.config, PathBuf::from("/r/R1/L1/config.txt"));
        assert_eq!(paths.output, PathBuf::from("/r/R1/L1/out.pdbqt"));
        assert_eq!(paths.log, PathBuf::from("/r/R1/L1/log.txt"));
        assert_eq!(paths.job_dir(), Some(Path::new("/r/R1/L1")));
    }
}
