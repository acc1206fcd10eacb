use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Contents of a `--config` TOML file. Every key is optional; unknown keys are errors.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub docking: Option<FileDockingConfig>,
    pub output: Option<FileOutputConfig>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDockingConfig {
    pub executable: Option<PathBuf>,
    pub num_modes: Option<u32>,
    pub box_size: Option<f64>,
    pub reserve_cores: Option<usize>,
    pub receptor_extensions: Option<Vec<String>>,
    pub ligand_extension: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileOutputConfig {
    pub directory: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
