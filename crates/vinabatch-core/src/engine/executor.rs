use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::io::config_file::write_job_config_to_path;
use crate::core::models::job::Job;
use crate::core::models::outcome::{BatchTally, JobOutcome};
use std::any::Any;
use std::fs::File;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, mpsc};
use tracing::{debug, info, instrument, warn};

const STDERR_SEPARATOR: &[u8] = b"\n--- STDERR ---\n";

/// The external docking executable and any arguments placed before the per-job ones.
///
/// Every job runs as `<executable> [leading args] --config <config> --cpu 1` with
/// `OMP_NUM_THREADS=1`, so `W` concurrent jobs occupy at most `W` threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockingProgram {
    pub executable: PathBuf,
    pub leading_args: Vec<String>,
}

impl DockingProgram {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self, config: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .args(&self.leading_args)
            .arg("--config")
            .arg(config)
            .args(["--cpu", "1"])
            .env("OMP_NUM_THREADS", "1");
        command
    }
}

/// Runs jobs on a fixed-size worker pool, one child process per job.
pub struct ExecutionEngine {
    program: Arc<DockingProgram>,
    workers: usize,
}

impl ExecutionEngine {
    pub fn new(program: DockingProgram, workers: usize) -> Self {
        Self {
            program: Arc::new(program),
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Executes every job exactly once and hands each outcome to `on_outcome` on the
    /// calling thread, in completion order.
    ///
    /// Submission never blocks; the caller only waits while draining completions.
    /// Job failures, including a panicking worker, become failed outcomes and never
    /// abort the batch.
    #[instrument(skip_all, name = "execution", fields(jobs = jobs.len(), workers = self.workers))]
    pub fn run<F>(
        &self,
        jobs: Vec<Job>,
        reporter: &ProgressReporter,
        mut on_outcome: F,
    ) -> Result<BatchTally, EngineError>
    where
        F: FnMut(&JobOutcome),
    {
        reporter.report(Progress::PhaseStart { name: "Docking" });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("dock-worker-{}", i))
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;

        let mut tally = BatchTally::new(jobs.len());
        reporter.report(Progress::TaskStart {
            total: jobs.len() as u64,
        });
        info!("Submitting {} jobs to {} workers.", jobs.len(), self.workers);

        let (tx, rx) = mpsc::channel::<JobOutcome>();
        for job in jobs {
            let tx = tx.clone();
            let program = Arc::clone(&self.program);
            pool.spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute_job(&program, &job)))
                    .unwrap_or_else(|payload| {
                        JobOutcome::failed(
                            &job,
                            format!("worker panicked: {}", panic_message(payload.as_ref())),
                        )
                    });
                // The receiver outlives every sender; a failed send means the caller is gone.
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        for outcome in rx {
            tally.record(&outcome);
            if !outcome.success {
                warn!(
                    ligand = %outcome.ligand_id,
                    receptor = %outcome.receptor_id,
                    "Docking failed: {}",
                    outcome.message
                );
            }
            on_outcome(&outcome);
            reporter.report(Progress::TaskUpdate {
                done: tally.done as u64,
                successes: tally.successes as u64,
                failures: tally.failures as u64,
            });
        }

        reporter.report(Progress::TaskFinish);

        if !tally.is_complete() {
            return Err(EngineError::Internal(format!(
                "{} of {} jobs reported an outcome",
                tally.done, tally.total
            )));
        }

        info!(
            successes = tally.successes,
            failures = tally.failures,
            "Docking batch finished."
        );
        reporter.report(Progress::PhaseFinish);
        Ok(tally)
    }
}

fn execute_job(program: &DockingProgram, job: &Job) -> JobOutcome {
    if let Err(e) = write_job_config_to_path(job, &job.paths.config) {
        return JobOutcome::failed(
            job,
            format!(
                "could not write config '{}': {}",
                job.paths.config.display(),
                e
            ),
        );
    }

    debug!(
        ligand = %job.ligand_id,
        receptor = %job.receptor_id,
        "Launching docking program."
    );
    let output = match program.command(&job.paths.config).output() {
        Ok(output) => output,
        Err(e) => {
            return JobOutcome::failed(
                job,
                format!(
                    "failed to launch '{}': {}",
                    program.executable.display(),
                    e
                ),
            );
        }
    };

    if let Err(e) = write_log(&job.paths.log, &output) {
        warn!(
            "Could not write job log '{}': {}",
            job.paths.log.display(),
            e
        );
    }

    if output.status.success() {
        JobOutcome::succeeded(job)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("exited with {}", output.status),
            text => text.to_string(),
        };
        JobOutcome::failed(job, message)
    }
}

fn write_log(path: &Path, output: &Output) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(&output.stdout)?;
    if !output.stderr.is_empty() {
        if !output.stdout.is_empty() {
            file.write_all(STDERR_SEPARATOR)?;
        }
        file.write_all(&output.stderr)?;
    }
    file.flush()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
