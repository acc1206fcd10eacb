use crate::cli::DockArgs;
use crate::config::{EXECUTABLE_ENV_VAR, build_dock_config};
use crate::error::Result;
use crate::ui::{CliProgressHandler, UiEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};
use vinabatch::{core::resources::ResourceSizer, engine::progress::ProgressReporter, workflows};

pub async fn run(args: DockArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    info!("Merging configuration from file, CLI arguments and environment...");
    let config = build_dock_config(&args, std::env::var(EXECUTABLE_ENV_VAR).ok())?;
    info!(
        "Docking program: {}",
        config.program.executable.display()
    );

    let sizer = ResourceSizer::detect();
    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting docking batch...");
    info!("Invoking the core docking workflow...");

    let run = tokio::task::block_in_place(|| workflows::dock::run(&config, &sizer, &reporter))?;

    println!(
        "Docking complete: {} of {} jobs succeeded, {} failed ({} table rows skipped).",
        run.tally.successes, run.tally.total, run.tally.failures, run.skipped
    );
    if run.tally.failures > 0 {
        warn!(
            "{} docking jobs failed; see the per-job log files and the run log.",
            run.tally.failures
        );
    }
    println!("  Results dir    : {}", run.results_dir.display());
    println!("  Run log        : {}", run.ledger.display());
    println!("  Duration report: {}", run.duration_report.display());
    println!("  Summary report : {}", run.summary_report.display());

    Ok(())
}
