use crate::cli::ParseArgs;
use crate::config::build_parse_config;
use crate::error::Result;
use crate::ui::{CliProgressHandler, UiEvent};
use tokio::sync::mpsc;
use tracing::info;
use vinabatch::{core::resources::ResourceSizer, engine::progress::ProgressReporter, workflows};

pub async fn run(args: ParseArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let config = build_parse_config(&args, &ResourceSizer::detect())?;
    info!(
        "Parsing {} with {} readers.",
        config.results_root.display(),
        config.workers
    );

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let run = tokio::task::block_in_place(|| workflows::parse::run(&config, &reporter))?;

    println!(
        "Parsed {} targets ({} mode): {} with results, {} without, {} pose rows.",
        run.processed, run.mode, run.hits, run.misses, run.rows
    );
    if let Some(path) = &run.final_table {
        println!("  Sorted table : {}", path.display());
    }
    if let Some(path) = &run.live_table {
        println!("  Live table   : {}", path.display());
    }
    if let Some(path) = &run.progress_log {
        println!("  Progress log : {}", path.display());
    }

    Ok(())
}
