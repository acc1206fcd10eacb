use super::executor::DockingProgram;
use crate::core::io::table::TableLayout;
use crate::core::models::job::{RECEPTOR_EXTENSIONS, RESULT_FILE_NAME};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BOX_SIZE: f64 = 20.0;
pub const DEFAULT_RESERVE_CORES: usize = 1;
pub const DEFAULT_LIGAND_EXTENSION: &str = "pdbqt";
pub const DEFAULT_HEARTBEAT: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Everything needed to run one docking batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub receptor_dir: PathBuf,
    pub ligand_dir: PathBuf,
    pub parameter_table: PathBuf,
    pub num_modes: u32,
    /// Directory receiving the results tree and the run reports.
    pub output_root: PathBuf,
    pub program: DockingProgram,
    pub reserve_cores: usize,
    /// Fixed worker count; when absent the count is sized from the host.
    pub max_workers: Option<usize>,
    /// Box edge used for receptors whose parameter row has no size.
    pub default_box_size: f64,
    pub receptor_extensions: Vec<String>,
    pub ligand_extension: String,
}

#[derive(Default)]
pub struct BatchConfigBuilder {
    receptor_dir: Option<PathBuf>,
    ligand_dir: Option<PathBuf>,
    parameter_table: Option<PathBuf>,
    num_modes: Option<u32>,
    output_root: Option<PathBuf>,
    program: Option<DockingProgram>,
    reserve_cores: Option<usize>,
    max_workers: Option<usize>,
    default_box_size: Option<f64>,
    receptor_extensions: Option<Vec<String>>,
    ligand_extension: Option<String>,
}

impl BatchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receptor_dir(mut self, path: PathBuf) -> Self {
        self.receptor_dir = Some(path);
        self
    }
    pub fn ligand_dir(mut self, path: PathBuf) -> Self {
        self.ligand_dir = Some(path);
        self
    }
    pub fn parameter_table(mut self, path: PathBuf) -> Self {
        self.parameter_table = Some(path);
        self
    }
    pub fn num_modes(mut self, n: u32) -> Self {
        self.num_modes = Some(n);
        self
    }
    pub fn output_root(mut self, path: PathBuf) -> Self {
        self.output_root = Some(path);
        self
    }
    pub fn program(mut self, program: DockingProgram) -> Self {
        self.program = Some(program);
        self
    }
    pub fn reserve_cores(mut self, n: usize) -> Self {
        self.reserve_cores = Some(n);
        self
    }
    pub fn max_workers(mut self, n: Option<usize>) -> Self {
        self.max_workers = n;
        self
    }
    pub fn default_box_size(mut self, size: f64) -> Self {
        self.default_box_size = Some(size);
        self
    }
    pub fn receptor_extensions(mut self, extensions: Vec<String>) -> Self {
        self.receptor_extensions = Some(extensions);
        self
    }
    pub fn ligand_extension(mut self, extension: String) -> Self {
        self.ligand_extension = Some(extension);
        self
    }

    pub fn build(self) -> Result<BatchConfig, ConfigError> {
        let num_modes = self
            .num_modes
            .ok_or(ConfigError::MissingParameter("num_modes"))?;
        if num_modes == 0 {
            return Err(ConfigError::InvalidValue {
                name: "num_modes",
                reason: "must be at least 1".to_string(),
            });
        }
        let default_box_size = self.default_box_size.unwrap_or(DEFAULT_BOX_SIZE);
        if !(default_box_size.is_finite() && default_box_size > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "default_box_size",
                reason: format!("must be a positive number, got {}", default_box_size),
            });
        }
        if self.max_workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                name: "max_workers",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(BatchConfig {
            receptor_dir: self
                .receptor_dir
                .ok_or(ConfigError::MissingParameter("receptor_dir"))?,
            ligand_dir: self
                .ligand_dir
                .ok_or(ConfigError::MissingParameter("ligand_dir"))?,
            parameter_table: self
                .parameter_table
                .ok_or(ConfigError::MissingParameter("parameter_table"))?,
            num_modes,
            output_root: self.output_root.unwrap_or_else(|| PathBuf::from(".")),
            program: self
                .program
                .ok_or(ConfigError::MissingParameter("program"))?,
            reserve_cores: self.reserve_cores.unwrap_or(DEFAULT_RESERVE_CORES),
            max_workers: self.max_workers,
            default_box_size,
            receptor_extensions: self.receptor_extensions.unwrap_or_else(|| {
                RECEPTOR_EXTENSIONS.iter().map(|e| e.to_string()).collect()
            }),
            ligand_extension: self
                .ligand_extension
                .unwrap_or_else(|| DEFAULT_LIGAND_EXTENSION.to_string()),
        })
    }
}

/// How result artifacts are located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Walk the results tree; an empty scope means every receptor directory.
    Crawl { scope: Vec<String> },
    /// Replay the success lines of a run ledger (or summary report).
    Ledger { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseConfig {
    pub results_root: PathBuf,
    pub discovery: DiscoveryMode,
    /// Exact result file name, or `*.<ext>` to match by extension in crawl mode.
    pub target_name: String,
    pub workers: usize,
    pub live: bool,
    pub progress_log: bool,
    pub heartbeat: usize,
    pub sort: bool,
    pub layout: TableLayout,
    /// Where the output tables go; defaults to the parent of the results root.
    pub output_dir: Option<PathBuf>,
}

#[derive(Default)]
pub struct ParseConfigBuilder {
    results_root: Option<PathBuf>,
    discovery: Option<DiscoveryMode>,
    target_name: Option<String>,
    workers: Option<usize>,
    live: bool,
    progress_log: bool,
    heartbeat: Option<usize>,
    skip_sort: bool,
    layout: Option<TableLayout>,
    output_dir: Option<PathBuf>,
}

impl ParseConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results_root(mut self, path: PathBuf) -> Self {
        self.results_root = Some(path);
        self
    }
    pub fn discovery(mut self, mode: DiscoveryMode) -> Self {
        self.discovery = Some(mode);
        self
    }
    pub fn target_name(mut self, name: String) -> Self {
        self.target_name = Some(name);
        self
    }
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }
    pub fn live(mut self, enabled: bool) -> Self {
        self.live = enabled;
        self
    }
    pub fn progress_log(mut self, enabled: bool) -> Self {
        self.progress_log = enabled;
        self
    }
    pub fn heartbeat(mut self, every: usize) -> Self {
        self.heartbeat = Some(every);
        self
    }
    pub fn skip_sort(mut self, skip: bool) -> Self {
        self.skip_sort = skip;
        self
    }
    pub fn layout(mut self, layout: TableLayout) -> Self {
        self.layout = Some(layout);
        self
    }
    pub fn output_dir(mut self, path: Option<PathBuf>) -> Self {
        self.output_dir = path;
        self
    }

    pub fn build(self) -> Result<ParseConfig, ConfigError> {
        let workers = self.workers.ok_or(ConfigError::MissingParameter("workers"))?;
        if workers == 0 {
            return Err(ConfigError::InvalidValue {
                name: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        let target_name = self
            .target_name
            .unwrap_or_else(|| RESULT_FILE_NAME.to_string());
        if target_name.is_empty() || target_name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                name: "target_name",
                reason: format!("'{}' is not a plain file name", target_name),
            });
        }

        Ok(ParseConfig {
            results_root: self
                .results_root
                .ok_or(ConfigError::MissingParameter("results_root"))?,
            discovery: self
                .discovery
                .unwrap_or(DiscoveryMode::Crawl { scope: Vec::new() }),
            target_name,
            workers,
            live: self.live,
            progress_log: self.progress_log,
            heartbeat: self.heartbeat.unwrap_or(DEFAULT_HEARTBEAT).max(1),
            sort: !self.skip_sort,
            layout: self.layout.unwrap_or(TableLayout::Full),
            output_dir: self.output_dir,
        })
    }
}
