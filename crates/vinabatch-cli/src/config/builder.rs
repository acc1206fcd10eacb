use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use crate::cli::{DockArgs, ParseArgs};
use crate::error::{CliError, Result};
use std::path::PathBuf;
use vinabatch::core::io::table::TableLayout;
use vinabatch::core::resources::ResourceSizer;
use vinabatch::engine::config::{
    BatchConfig, BatchConfigBuilder, DiscoveryMode, ParseConfig, ParseConfigBuilder,
};
use vinabatch::engine::executor::DockingProgram;

/// Merges `dock` settings. Precedence: CLI flag, config file, `env_executable`
/// (for the executable only), built-in default.
pub fn build_dock_config(args: &DockArgs, env_executable: Option<String>) -> Result<BatchConfig> {
    let defaults = DefaultsConfig::default();

    let mut file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let docking = file_config.docking.take().unwrap_or_default();
    let output = file_config.output.take().unwrap_or_default();

    let executable = args
        .executable
        .clone()
        .or(docking.executable)
        .or_else(|| env_executable.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(&defaults.executable));
    let num_modes = args
        .num_modes
        .or(docking.num_modes)
        .unwrap_or(defaults.num_modes);
    let box_size = args
        .box_size
        .or(docking.box_size)
        .unwrap_or(defaults.box_size);
    let reserve_cores = args
        .reserve_cores
        .or(docking.reserve_cores)
        .unwrap_or(defaults.reserve_cores);
    let receptor_extensions = docking
        .receptor_extensions
        .unwrap_or(defaults.receptor_extensions);
    if receptor_extensions.is_empty() {
        return Err(CliError::Config(
            "'docking.receptor-extensions' must list at least one extension.".to_string(),
        ));
    }
    let ligand_extension = docking
        .ligand_extension
        .map(|ext| ext.trim_start_matches('.').to_string())
        .unwrap_or(defaults.ligand_extension);
    let output_root = args
        .output_dir
        .clone()
        .or(output.directory)
        .unwrap_or_else(|| PathBuf::from(&defaults.output_directory));

    BatchConfigBuilder::new()
        .receptor_dir(args.receptors.clone())
        .ligand_dir(args.ligands.clone())
        .parameter_table(args.parameter_table.clone())
        .num_modes(num_modes)
        .output_root(output_root)
        .program(DockingProgram::new(executable))
        .reserve_cores(reserve_cores)
        .max_workers(args.workers)
        .default_box_size(box_size)
        .receptor_extensions(receptor_extensions)
        .ligand_extension(ligand_extension)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// `parse` settings come from flags alone; the reader pool is sized from `sizer`
/// unless `--workers` is given.
pub fn build_parse_config(args: &ParseArgs, sizer: &ResourceSizer) -> Result<ParseConfig> {
    let discovery = match &args.from_log {
        Some(path) => DiscoveryMode::Ledger { path: path.clone() },
        None => DiscoveryMode::Crawl {
            scope: args.scope.clone(),
        },
    };
    let layout = if args.fast {
        TableLayout::Compact
    } else {
        TableLayout::Full
    };

    ParseConfigBuilder::new()
        .results_root(args.results.clone())
        .discovery(discovery)
        .target_name(args.name.clone())
        .workers(args.workers.unwrap_or_else(|| sizer.parse_worker_count()))
        .live(args.live)
        .progress_log(args.progress_log)
        .heartbeat(args.heartbeat)
        .skip_sort(args.no_sort)
        .layout(layout)
        .output_dir(args.output_dir.clone())
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}
