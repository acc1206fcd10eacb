use super::discovery::ParseTarget;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::io::parse_log::{ParseLog, percent};
use crate::core::io::result_file::read_poses_from_path;
use crate::core::io::table::LiveTable;
use crate::core::models::pose::PoseRecord;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Counts and records of one parse run. Records are in completion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub records: Vec<PoseRecord>,
    pub processed: usize,
    /// Targets that yielded at least one pose.
    pub hits: usize,
    /// Targets that were missing, unreadable or had no score lines.
    pub misses: usize,
}

struct Parsed {
    path: PathBuf,
    records: Vec<PoseRecord>,
}

/// Extracts pose records from result artifacts on a bounded, I/O-oriented pool.
pub struct ResultParser<'a> {
    workers: usize,
    results_root: PathBuf,
    run_timestamp: Option<String>,
    heartbeat: usize,
    live: Option<&'a LiveTable>,
    log: Option<&'a ParseLog>,
}

impl<'a> ResultParser<'a> {
    /// `results_root` is stripped from artifact paths to form each record's `OutFile`.
    pub fn new(workers: usize, results_root: impl Into<PathBuf>) -> Self {
        Self {
            workers: workers.max(1),
            results_root: results_root.into(),
            run_timestamp: None,
            heartbeat: 1000,
            live: None,
            log: None,
        }
    }

    pub fn with_run_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.run_timestamp = timestamp;
        self
    }

    pub fn with_heartbeat(mut self, every: usize) -> Self {
        self.heartbeat = every.max(1);
        self
    }

    pub fn with_live_table(mut self, table: Option<&'a LiveTable>) -> Self {
        self.live = table;
        self
    }

    pub fn with_progress_log(mut self, log: Option<&'a ParseLog>) -> Self {
        self.log = log;
        self
    }

    #[instrument(skip_all, name = "result_parsing", fields(targets = targets.len(), workers = self.workers))]
    pub fn run(
        &self,
        targets: Vec<ParseTarget>,
        reporter: &ProgressReporter,
    ) -> Result<ParseOutcome, EngineError> {
        reporter.report(Progress::PhaseStart { name: "Parsing" });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("parse-worker-{}", i))
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;

        let total = targets.len();
        reporter.report(Progress::TaskStart {
            total: total as u64,
        });

        let mut outcome = ParseOutcome::default();
        let (tx, rx) = mpsc::channel::<Parsed>();

        pool.in_place_scope(|scope| {
            for target in targets {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let parsed = self.parse_target(target);
                    // Scope keeps the receiver alive until every task has finished.
                    let _ = tx.send(parsed);
                });
            }
            drop(tx);

            for parsed in rx {
                self.absorb(parsed, total, &mut outcome);
                reporter.report(Progress::TaskUpdate {
                    done: outcome.processed as u64,
                    successes: outcome.hits as u64,
                    failures: outcome.misses as u64,
                });
            }
        });

        reporter.report(Progress::TaskFinish);

        if let Some(log) = self.log {
            if let Err(e) = log.done(outcome.processed, total, outcome.hits) {
                warn!("Could not write parse log '{}': {}", log.path().display(), e);
            }
        }
        info!(
            processed = outcome.processed,
            hits = outcome.hits,
            misses = outcome.misses,
            "Parsed {} targets; {} files had results.",
            outcome.processed,
            outcome.hits
        );
        reporter.report(Progress::PhaseFinish);
        Ok(outcome)
    }

    /// Runs on a worker. Missing or unreadable artifacts yield no records.
    fn parse_target(&self, target: ParseTarget) -> Parsed {
        let poses = match read_poses_from_path(&target.path) {
            Ok(poses) => poses,
            Err(e) => {
                debug!("Cannot read {}: {}", target.path.display(), e);
                Vec::new()
            }
        };

        let out_file = relative_to(&target.path, &self.results_root);
        let records: Vec<PoseRecord> = poses
            .into_iter()
            .map(|pose| PoseRecord {
                receptor: target.receptor.clone(),
                ligand: target.ligand.clone(),
                pose: pose.index,
                score: pose.score,
                out_file: out_file.clone(),
                run_timestamp: self.run_timestamp.clone(),
            })
            .collect();

        if let Some(live) = self.live {
            if let Err(e) = live.append(&records) {
                warn!("Could not append to live table '{}': {}", live.path().display(), e);
            }
        }

        Parsed {
            path: target.path,
            records,
        }
    }

    /// Runs on the draining thread.
    fn absorb(&self, parsed: Parsed, total: usize, outcome: &mut ParseOutcome) {
        outcome.processed += 1;
        if parsed.records.is_empty() {
            outcome.misses += 1;
        } else {
            outcome.hits += 1;
            if let Some(log) = self.log {
                if let Err(e) = log.found(&parsed.path, parsed.records.len()) {
                    warn!("Could not write parse log '{}': {}", log.path().display(), e);
                }
            }
            outcome.records.extend(parsed.records);
        }

        if outcome.processed % self.heartbeat == 0 {
            info!(
                "Heartbeat: processed {}/{} ({}%), hits {}",
                outcome.processed,
                total,
                percent(outcome.processed, total),
                outcome.hits
            );
            if let Some(log) = self.log {
                if let Err(e) = log.heartbeat(outcome.processed, total, outcome.hits) {
                    warn!("Could not write parse log '{}': {}", log.path().display(), e);
                }
            }
        }
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::table::TableLayout;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn artifact(root: &Path, receptor: &str, ligand: &str, body: &str) -> ParseTarget {
        let path = root.join(receptor).join(ligand).join("out.pdbqt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        ParseTarget {
            receptor: receptor.into(),
            ligand: ligand.into(),
            path,
        }
    }

    fn missing(root: &Path, receptor: &str, ligand: &str) -> ParseTarget {
        ParseTarget {
            receptor: receptor.into(),
            ligand: ligand.into(),
            path: root.join(receptor).join(ligand).join("out.pdbqt"),
        }
    }

    fn fixture() -> (TempDir, Vec<ParseTarget>) {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let targets = vec![
            artifact(
                &root,
                "R1",
                "L1",
                "REMARK VINA RESULT: -7.5 0 0\nREMARK VINA RESULT: -6.5 1 2\n",
            ),
            artifact(&root, "R1", "L2", "MODEL 1\nENDMDL\n"),
            artifact(&root, "R2", "L1", "REMARK VINA RESULT: -9.0 0 0\n"),
            missing(&root, "R2", "L2"),
        ];
        (dir, targets)
    }

    #[test]
    fn counts_hits_and_misses_without_erroring() {
        let (dir, targets) = fixture();

        let outcome = ResultParser::new(3, dir.path())
            .run(targets, &ProgressReporter::new())
            .unwrap();

        assert_eq!(outcome.processed, 4);
        assert_eq!(outcome.hits, 2);
        assert_eq!(outcome.misses, 2);
        assert_eq!(outcome.records.len(), 3);
    }

    #[test]
    fn records_carry_pose_index_and_relative_out_file() {
        let (dir, targets) = fixture();

        let outcome = ResultParser::new(1, dir.path())
            .with_run_timestamp(Some("2024-05-01_12-00-00".into()))
            .run(targets, &ProgressReporter::new())
            .unwrap();

        let mut l1: Vec<_> = outcome
            .records
            .iter()
            .filter(|r| r.receptor == "R1" && r.ligand == "L1")
            .collect();
        l1.sort_by_key(|r| r.pose);
        assert_eq!(l1.len(), 2);
        assert_eq!((l1[0].pose, l1[0].score), (1, -7.5));
        assert_eq!((l1[1].pose, l1[1].score), (2, -6.5));
        assert_eq!(l1[0].out_file, PathBuf::from("R1/L1/out.pdbqt"));
        assert_eq!(l1[0].run_timestamp.as_deref(), Some("2024-05-01_12-00-00"));
    }

    #[test]
    fn live_table_and_progress_log_receive_every_hit() {
        let (dir, targets) = fixture();
        let out = tempdir().unwrap();
        let live = LiveTable::create(&out.path().join("live.csv"), TableLayout::Compact).unwrap();
        let log = ParseLog::create(&out.path().join("progress.log"), "ts", targets.len()).unwrap();

        ResultParser::new(2, dir.path())
            .with_heartbeat(2)
            .with_live_table(Some(&live))
            .with_progress_log(Some(&log))
            .run(targets, &ProgressReporter::new())
            .unwrap();

        let live_text = fs::read_to_string(live.path()).unwrap();
        assert_eq!(live_text.lines().count(), 1 + 3);

        let log_text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(log_text.matches("[FOUND] ").count(), 2);
        assert_eq!(log_text.matches("[HEARTBEAT] ").count(), 2);
        assert!(log_text.contains("[HEARTBEAT] processed=4/4 (100%)  hits=2\n"));
        assert!(log_text.ends_with("[DONE] processed=4/4  hits=2\n"));
    }

    #[test]
    fn empty_target_list_parses_nothing() {
        let dir = tempdir().unwrap();
        let outcome = ResultParser::new(4, dir.path())
            .run(Vec::new(), &ProgressReporter::new())
            .unwrap();
        assert_eq!(outcome, ParseOutcome::default());
    }
}
