use super::error::EngineError;
use crate::core::io::ledger_line::{format_note, format_outcome};
use crate::core::models::outcome::JobOutcome;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

struct LedgerState {
    file: File,
    outcome_lines: Vec<String>,
    successes: usize,
    failures: usize,
}

/// Append-only record of a batch.
///
/// Each call writes exactly one line and flushes it before returning, so the file is
/// consistent up to the last completed job even if the process is killed. All writes
/// go through one lock, which keeps lines from interleaving.
pub struct RunLedger {
    path: PathBuf,
    state: Mutex<LedgerState>,
}

/// Run facts the ledger cannot know by itself, rendered into the post-run reports.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
    pub total_jobs: usize,
    pub available_units: usize,
    pub workers: usize,
    pub receptor_dir: PathBuf,
    pub ligand_dir: PathBuf,
    pub parameter_table: PathBuf,
    pub results_dir: PathBuf,
    pub num_modes: u32,
}

impl RunLedger {
    pub fn create(path: &Path) -> Result<Self, EngineError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| EngineError::io(path, e))?;
        debug!("Opened run ledger {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(LedgerState {
                file,
                outcome_lines: Vec::new(),
                successes: 0,
                failures: 0,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, outcome: &JobOutcome) -> io::Result<()> {
        let line = format_outcome(outcome);
        let mut state = self.lock();
        write_line(&mut state.file, &line)?;
        if outcome.success {
            state.successes += 1;
        } else {
            state.failures += 1;
        }
        state.outcome_lines.push(line);
        Ok(())
    }

    /// Appends free text, such as a skipped input. Notes are not outcomes.
    pub fn note(&self, text: &str) -> io::Result<()> {
        let mut state = self.lock();
        write_line(&mut state.file, &format_note(text))
    }

    /// `(successes, failures)` recorded so far.
    pub fn counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.successes, state.failures)
    }

    /// Writes the duration report and the summary report.
    ///
    /// The summary repeats every outcome line in completion order, so it can stand in
    /// for the ledger when replaying successes.
    pub fn summarize(
        &self,
        report: &RunReport,
        duration_path: &Path,
        summary_path: &Path,
    ) -> Result<(), EngineError> {
        let state = self.lock();
        let times = ReportTimes::new(report);

        write_report(duration_path, |w| {
            writeln!(w, "Start Time : {}", times.start)?;
            writeln!(w, "End Time   : {}", times.end)?;
            writeln!(w, "Duration   : {:.2} minutes", times.minutes)?;
            writeln!(w, "Duration_s : {:.2} seconds", times.seconds)?;
            writeln!(w, "Jobs Total : {}", report.total_jobs)?;
            writeln!(w, "Successes  : {}", state.successes)?;
            writeln!(w, "Failures   : {}", state.failures)
        })?;

        write_report(summary_path, |w| {
            writeln!(w, "Docking Summary Report")?;
            writeln!(w, "=======================")?;
            writeln!(w, "Start Time : {}", times.start)?;
            writeln!(w, "End Time   : {}", times.end)?;
            writeln!(w, "Total Time : {:.2} minutes", times.minutes)?;
            writeln!(w, "Jobs Run   : {}", report.total_jobs)?;
            writeln!(w, "Successes  : {}", state.successes)?;
            writeln!(w, "Failures   : {}", state.failures)?;
            writeln!(w)?;
            writeln!(w, "System Info:")?;
            writeln!(
                w,
                " - Platform: {} {}",
                std::env::consts::OS,
                std::env::consts::ARCH
            )?;
            writeln!(w, " - CPU Units (schedulable): {}", report.available_units)?;
            writeln!(w, " - Max Workers (units used): {}", report.workers)?;
            writeln!(w, " - Threads per job: 1 (via --cpu 1 / OMP_NUM_THREADS=1)")?;
            writeln!(w)?;
            writeln!(w, "Inputs/Outputs:")?;
            writeln!(w, " - Receptor dir: {}", report.receptor_dir.display())?;
            writeln!(w, " - Ligand dir  : {}", report.ligand_dir.display())?;
            writeln!(w, " - Centers CSV : {}", report.parameter_table.display())?;
            writeln!(w, " - Results dir : {}", report.results_dir.display())?;
            writeln!(w, " - Run log     : {}", self.path.display())?;
            writeln!(w, " - num_modes   : {}", report.num_modes)?;
            writeln!(w)?;
            writeln!(w, "Results:")?;
            writeln!(w, "--------")?;
            for line in &state.outcome_lines {
                writeln!(w, "{}", line)?;
            }
            Ok(())
        })?;

        info!(
            duration = %duration_path.display(),
            summary = %summary_path.display(),
            "Run reports written."
        );
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct ReportTimes {
    start: String,
    end: String,
    minutes: f64,
    seconds: f64,
}

impl ReportTimes {
    fn new(report: &RunReport) -> Self {
        let seconds = report.elapsed.as_secs_f64();
        Self {
            start: report.started_at.format(REPORT_TIME_FORMAT).to_string(),
            end: report.finished_at.format(REPORT_TIME_FORMAT).to_string(),
            minutes: seconds / 60.0,
            seconds,
        }
    }
}

fn write_line(file: &mut File, line: &str) -> io::Result<()> {
    // Single write so an unlocked reader never sees half a line.
    file.write_all(format!("{}\n", line).as_bytes())?;
    file.flush()
}

fn write_report(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), EngineError> {
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| EngineError::io(path, e))
}
