use crate::core::models::outcome::BatchTally;
use crate::core::naming::RunTag;
use crate::core::resources::ResourceSizer;
use crate::engine::config::BatchConfig;
use crate::engine::error::EngineError;
use crate::engine::executor::ExecutionEngine;
use crate::engine::ledger::{RunLedger, RunReport};
use crate::engine::matrix::JobMatrixBuilder;
use crate::engine::progress::{Progress, ProgressReporter};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Where a docking run put its artifacts and how it went.
#[derive(Debug, Clone, PartialEq)]
pub struct DockingRun {
    pub tag: String,
    pub results_dir: PathBuf,
    pub ledger: PathBuf,
    pub duration_report: PathBuf,
    pub summary_report: PathBuf,
    pub tally: BatchTally,
    pub skipped: usize,
    pub available_units: usize,
    pub workers: usize,
}

#[instrument(skip_all, name = "docking_workflow")]
pub fn run(
    config: &BatchConfig,
    sizer: &ResourceSizer,
    reporter: &ProgressReporter,
) -> Result<DockingRun, EngineError> {
    let started_at = Local::now();
    let clock = Instant::now();

    // === Phase 1: Resolve inputs and build the job matrix ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let config = absolutize(config)?;
    fs::create_dir_all(&config.output_root)
        .map_err(|e| EngineError::io(&config.output_root, e))?;

    let tag = RunTag::new(
        &config.receptor_dir,
        &config.ligand_dir,
        config.num_modes,
        &started_at,
    );
    let results_dir = tag.results_dir(&config.output_root);
    info!("Run tag: {}", tag.as_str());

    let matrix = JobMatrixBuilder::new(&config).build(&results_dir)?;

    let ledger = RunLedger::create(&tag.ledger(&config.output_root))?;
    for entry in &matrix.skipped {
        if let Err(e) = ledger.note(&entry.to_string()) {
            warn!("Could not write to run ledger: {}", e);
        }
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Execute ===
    let available_units = sizer.available_units();
    let workers = match config.max_workers {
        Some(requested) if requested > available_units => {
            warn!(
                "Requested {} docking workers but only {} units are schedulable; using {}.",
                requested, available_units, available_units
            );
            available_units
        }
        Some(requested) => requested,
        None => sizer.worker_count(config.reserve_cores),
    };
    info!(
        "Detected {} schedulable units. Running up to {} concurrent docking jobs (reserve {}).",
        available_units, workers, config.reserve_cores
    );
    reporter.report(Progress::Message(format!(
        "Results dir: {}",
        results_dir.display()
    )));

    let total_jobs = matrix.jobs.len();
    let engine = ExecutionEngine::new(config.program.clone(), workers);
    let tally = engine.run(matrix.jobs, reporter, |outcome| {
        if let Err(e) = ledger.record(outcome) {
            warn!(
                "Could not record outcome of {} vs {} in run ledger: {}",
                outcome.ligand_id, outcome.receptor_file_name, e
            );
        }
    })?;

    // === Phase 3: Reports ===
    let report = RunReport {
        started_at,
        finished_at: Local::now(),
        elapsed: clock.elapsed(),
        total_jobs,
        available_units,
        workers: engine.workers(),
        receptor_dir: config.receptor_dir.clone(),
        ligand_dir: config.ligand_dir.clone(),
        parameter_table: config.parameter_table.clone(),
        results_dir: results_dir.clone(),
        num_modes: config.num_modes,
    };
    let duration_report = tag.duration_report(&config.output_root);
    let summary_report = tag.summary_report(&config.output_root);
    ledger.summarize(&report, &duration_report, &summary_report)?;

    info!(
        "Docking run complete: {} succeeded, {} failed. Results in {}",
        tally.successes,
        tally.failures,
        results_dir.display()
    );
    Ok(DockingRun {
        tag: tag.as_str().to_string(),
        results_dir,
        ledger: ledger.path().to_path_buf(),
        duration_report,
        summary_report,
        tally,
        skipped: matrix.skipped.len(),
        available_units,
        workers: engine.workers(),
    })
}

/// Input and output paths are made absolute so job configs and reports stay valid
/// regardless of the child process's working directory.
fn absolutize(config: &BatchConfig) -> Result<BatchConfig, EngineError> {
    fn absolute(path: &Path) -> Result<PathBuf, EngineError> {
        std::path::absolute(path).map_err(|e| EngineError::io(path, e))
    }
    let mut resolved = config.clone();
    resolved.receptor_dir = absolute(&config.receptor_dir)?;
    resolved.ligand_dir = absolute(&config.ligand_dir)?;
    resolved.parameter_table = absolute(&config.parameter_table)?;
    resolved.output_root = absolute(&config.output_root)?;
    Ok(resolved)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::engine::config::BatchConfigBuilder;
    use crate::engine::executor::DockingProgram;
    use tempfile::{TempDir, tempdir};

    const WRITES_ONE_POSE: &str = r#"
cfg="$2"
out=$(sed -n 's/^out = //p' "$cfg")
printf 'MODEL 1\nREMARK VINA RESULT: -7.5 0.000 0.000\nENDMDL\n' > "$out"
"#;

    fn workspace(table: &str, receptors: &[&str], ligands: &[&str], script: &str) -> (TempDir, BatchConfig) {
        let dir = tempdir().unwrap();
        let receptor_dir = dir.path().join("Receptors_Demo");
        let ligand_dir = dir.path().join("Ligands_CPD7_Ligands");
        fs::create_dir_all(&receptor_dir).unwrap();
        fs::create_dir_all(&ligand_dir).unwrap();
        for name in receptors {
            fs::write(receptor_dir.join(name), "ATOM\n").unwrap();
        }
        for name in ligands {
            fs::write(ligand_dir.join(name), "ATOM\n").unwrap();
        }
        fs::write(dir.path().join("centers.csv"), table).unwrap();
        let script_path = dir.path().join("fake_vina.sh");
        fs::write(&script_path, script).unwrap();

        let config = BatchConfigBuilder::new()
            .receptor_dir(receptor_dir)
            .ligand_dir(ligand_dir)
            .parameter_table(dir.path().join("centers.csv"))
            .num_modes(9)
            .output_root(dir.path().join("out"))
            .program(
                DockingProgram::new("sh")
                    .with_leading_args([script_path.to_string_lossy().into_owned()]),
            )
            .max_workers(Some(2))
            .build()
            .unwrap();
        (dir, config)
    }

    #[test]
    fn runs_every_job_and_writes_all_run_artifacts() {
        let (_dir, config) = workspace(
            "PDB_ID,X,Y,Z,SIZE\nR1,1,2,3,20\nR9,0,0,0,20\n",
            &["R1.pdbqt"],
            &["L1.pdbqt", "L2.pdbqt"],
            WRITES_ONE_POSE,
        );
        let sizer = ResourceSizer::from_parts(Some(4), None);

        let run = run(&config, &sizer, &ProgressReporter::new()).unwrap();

        assert!(run.tag.starts_with("Demo_CPD7_9Poses_"));
        assert_eq!(run.tally.total, 2);
        assert_eq!(run.tally.successes, 2);
        assert_eq!(run.skipped, 1);
        assert_eq!(run.workers, 2);
        assert!(run.results_dir.join("R1/L1/out.pdbqt").is_file());
        assert!(run.results_dir.join("R1/L2/log.txt").is_file());

        let ledger = fs::read_to_string(&run.ledger).unwrap();
        let lines: Vec<_> = ledger.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("❌ Missing receptor: "));
        assert!(lines.contains(&"✅ L1 → R1.pdbqt"));
        assert!(lines.contains(&"✅ L2 → R1.pdbqt"));

        let duration = fs::read_to_string(&run.duration_report).unwrap();
        assert!(duration.contains("Jobs Total : 2\n"));
        assert!(duration.contains("Successes  : 2\n"));
        let summary = fs::read_to_string(&run.summary_report).unwrap();
        assert!(summary.contains(&format!(" - Results dir : {}\n", run.results_dir.display())));
    }

    #[test]
    fn worker_count_comes_from_the_sizer_without_override() {
        let (_dir, mut config) = workspace(
            "PDB_ID,X,Y,Z\nR1,1,2,3\n",
            &["R1.pdbqt"],
            &["L1.pdbqt"],
            WRITES_ONE_POSE,
        );
        config.max_workers = None;
        config.reserve_cores = 1;
        let sizer = ResourceSizer::from_parts(Some(8), Some(3));

        let run = run(&config, &sizer, &ProgressReporter::new()).unwrap();

        assert_eq!(run.available_units, 3);
        assert_eq!(run.workers, 2);
    }

    #[test]
    fn explicit_worker_count_is_capped_at_schedulable_units() {
        let (_dir, mut config) = workspace(
            "PDB_ID,X,Y,Z\nR1,1,2,3\n",
            &["R1.pdbqt"],
            &["L1.pdbqt"],
            WRITES_ONE_POSE,
        );
        config.max_workers = Some(16);
        let sizer = ResourceSizer::from_parts(Some(8), Some(3));

        let run = run(&config, &sizer, &ProgressReporter::new()).unwrap();

        assert_eq!(run.available_units, 3);
        assert_eq!(run.workers, 3);
        assert_eq!(run.tally.successes, 1);
    }

    #[test]
    fn no_jobs_fails_before_creating_run_artifacts() {
        let (_dir, config) = workspace(
            "PDB_ID,X,Y,Z\nR9,1,2,3\n",
            &["R1.pdbqt"],
            &["L1.pdbqt"],
            WRITES_ONE_POSE,
        );

        let result = run(&config, &ResourceSizer::from_parts(Some(2), None), &ProgressReporter::new());

        assert!(matches!(result, Err(EngineError::NoJobs)));
        let leftovers: Vec<_> = fs::read_dir(&config.output_root).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
