use crate::core::io::parse_log::ParseLog;
use crate::core::io::table::{LiveTable, TableLayout, write_table};
use crate::core::models::job::RESULT_FILE_NAME;
use crate::core::models::pose::sort_pose_records;
use crate::core::naming::{ParseOutputs, timestamp_tag};
use crate::engine::config::{DiscoveryMode, ParseConfig};
use crate::engine::discovery::{JobDiscovery, LedgerReplay, TargetMatcher, TreeCrawl};
use crate::engine::error::EngineError;
use crate::engine::parser::ResultParser;
use crate::engine::progress::{Progress, ProgressReporter};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// What a parse run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseRun {
    pub mode: &'static str,
    pub targets: usize,
    pub processed: usize,
    pub hits: usize,
    pub misses: usize,
    pub rows: usize,
    pub final_table: Option<PathBuf>,
    pub live_table: Option<PathBuf>,
    pub progress_log: Option<PathBuf>,
}

#[instrument(skip_all, name = "parse_workflow")]
pub fn run(config: &ParseConfig, reporter: &ProgressReporter) -> Result<ParseRun, EngineError> {
    let started_at = Local::now();
    let stamp = timestamp_tag(&started_at);

    // === Phase 1: Discovery ===
    reporter.report(Progress::PhaseStart { name: "Discovery" });
    let discovery = select_discovery(config);
    let targets = discovery.discover()?;
    if targets.is_empty() {
        return Err(EngineError::NoTargets(no_targets_reason(config)));
    }
    info!(
        "{} mode: {} targets under {}",
        discovery.mode(),
        targets.len(),
        config.results_root.display()
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Output files ===
    let out_dir = output_dir(config);
    fs::create_dir_all(&out_dir).map_err(|e| EngineError::io(&out_dir, e))?;
    let outputs = ParseOutputs::new(&out_dir, &config.results_root, &started_at);

    let live = if config.live {
        let table = LiveTable::create(&outputs.live_table, config.layout)
            .map_err(|e| EngineError::csv(&outputs.live_table, e))?;
        info!("Live table: {}", outputs.live_table.display());
        Some(table)
    } else {
        None
    };
    let progress_log = if config.progress_log {
        let log = ParseLog::create(&outputs.progress_log, &stamp, targets.len())
            .map_err(|e| EngineError::io(&outputs.progress_log, e))?;
        info!("Progress log: {}", outputs.progress_log.display());
        Some(log)
    } else {
        None
    };

    // === Phase 3: Parse ===
    let run_timestamp = (config.layout == TableLayout::Full).then(|| stamp.clone());
    let target_count = targets.len();
    let mut outcome = ResultParser::new(config.workers, &config.results_root)
        .with_run_timestamp(run_timestamp)
        .with_heartbeat(config.heartbeat)
        .with_live_table(live.as_ref())
        .with_progress_log(progress_log.as_ref())
        .run(targets, reporter)?;

    // === Phase 4: Final table ===
    let final_table = if config.sort {
        sort_pose_records(&mut outcome.records);
        write_table(&outputs.final_table, config.layout, &outcome.records)
            .map_err(|e| EngineError::csv(&outputs.final_table, e))?;
        info!(
            "Final sorted table ({} rows): {}",
            outcome.records.len(),
            outputs.final_table.display()
        );
        Some(outputs.final_table.clone())
    } else if live.is_some() {
        info!("Skipped final sorting; the live table holds every row.");
        None
    } else {
        warn!("Skipped final sorting and no live table was requested; no table was written.");
        None
    };

    Ok(ParseRun {
        mode: discovery.mode(),
        targets: target_count,
        processed: outcome.processed,
        hits: outcome.hits,
        misses: outcome.misses,
        rows: outcome.records.len(),
        final_table,
        live_table: live.map(|table| table.path().to_path_buf()),
        progress_log: progress_log.map(|log| log.path().to_path_buf()),
    })
}

fn select_discovery(config: &ParseConfig) -> Box<dyn JobDiscovery> {
    let matcher = TargetMatcher::parse(&config.target_name);
    match &config.discovery {
        DiscoveryMode::Crawl { scope } => Box::new(
            TreeCrawl::new(&config.results_root, matcher).with_scope(scope.clone()),
        ),
        DiscoveryMode::Ledger { path } => {
            let file_name = match matcher {
                TargetMatcher::Exact(name) => name,
                TargetMatcher::Extension(_) => {
                    warn!(
                        "Ledger replay needs an exact result file name; using '{}' instead of '{}'.",
                        RESULT_FILE_NAME, config.target_name
                    );
                    RESULT_FILE_NAME.to_string()
                }
            };
            Box::new(LedgerReplay::new(path, &config.results_root, file_name))
        }
    }
}

fn no_targets_reason(config: &ParseConfig) -> String {
    match &config.discovery {
        DiscoveryMode::Crawl { .. } => format!(
            "no '{}' files under {}",
            config.target_name,
            config.results_root.display()
        ),
        DiscoveryMode::Ledger { path } => format!(
            "no successful entries (✅ <ligand> → <receptor>) in {}",
            path.display()
        ),
    }
}

fn output_dir(config: &ParseConfig) -> PathBuf {
    if let Some(dir) = &config.output_dir {
        return dir.clone();
    }
    match config.results_root.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::models::pose::PoseRecord;
    use crate::core::resources::ResourceSizer;
    use crate::engine::config::{BatchConfigBuilder, ParseConfigBuilder};
    use crate::engine::executor::DockingProgram;
    use crate::workflows::dock;
    use tempfile::{TempDir, tempdir};

    /// Writes one pose scored -7.5, except for ligand `L2` whose artifact is empty.
    const TRUNCATES_L2: &str = r#"
cfg="$2"
out=$(sed -n 's/^out = //p' "$cfg")
case "$out" in
  */L2/*) : > "$out" ;;
  *) printf 'MODEL 1\nREMARK VINA RESULT: -7.5 0.000 0.000\nENDMDL\n' > "$out" ;;
esac
"#;

    const SCORES_BY_RECEPTOR: &str = r#"
cfg="$2"
out=$(sed -n 's/^out = //p' "$cfg")
case "$out" in
  */R2/*) printf 'REMARK VINA RESULT: -9.1\nREMARK VINA RESULT: -8.0\n' > "$out" ;;
  *) printf 'REMARK VINA RESULT: -6.2\n' > "$out" ;;
esac
"#;

    fn dock_run(table: &str, receptors: &[&str], ligands: &[&str], script: &str) -> (TempDir, dock::DockingRun) {
        let dir = tempdir().unwrap();
        let receptor_dir = dir.path().join("receptors");
        let ligand_dir = dir.path().join("ligands");
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
            .num_modes(1)
            .output_root(dir.path().join("runs"))
            .program(
                DockingProgram::new("sh")
                    .with_leading_args([script_path.to_string_lossy().into_owned()]),
            )
            .max_workers(Some(3))
            .build()
            .unwrap();
        let run = dock::run(
            &config,
            &ResourceSizer::from_parts(Some(4), None),
            &ProgressReporter::new(),
        )
        .unwrap();
        (dir, run)
    }

    fn parse_config(root: &Path, discovery: DiscoveryMode) -> ParseConfigBuilder {
        ParseConfigBuilder::new()
            .results_root(root.to_path_buf())
            .discovery(discovery)
            .workers(4)
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn single_receptor_two_ligands_yields_two_sorted_rows() {
        let (_dir, docked) = dock_run(
            "PDB_ID,X,Y,Z,SIZE\nR1,1,2,3,20\n",
            &["R1.pdbqt"],
            &["L1.pdbqt", "L2.pdbqt"],
            r#"
cfg="$2"
out=$(sed -n 's/^out = //p' "$cfg")
echo "REMARK VINA RESULT: -7.5" > "$out"
"#,
        );
        assert_eq!((docked.tally.total, docked.tally.successes), (2, 2));

        let config = parse_config(&docked.results_dir, DiscoveryMode::Crawl { scope: vec![] })
            .layout(TableLayout::Compact)
            .build()
            .unwrap();
        let parsed = run(&config, &ProgressReporter::new()).unwrap();

        let rows = read_rows(parsed.final_table.as_ref().unwrap());
        assert_eq!(
            rows,
            vec![
                vec!["R1", "L1", "1", "-7.5", "R1/L1/out.pdbqt"],
                vec!["R1", "L2", "1", "-7.5", "R1/L2/out.pdbqt"],
            ]
        );
        assert_eq!(
            parsed.final_table.unwrap().parent(),
            docked.results_dir.parent()
        );
    }

    #[test]
    fn ledger_replay_finds_receptors_with_punctuated_names() {
        let (_dir, docked) = dock_run(
            "PDB_ID,X,Y,Z\n5R7Y+H,1,2,3\n",
            &["5R7Y+H.pdbqt"],
            &["L1.pdbqt"],
            SCORES_BY_RECEPTOR,
        );
        assert_eq!(docked.tally.successes, 1);

        let crawl = parse_config(&docked.results_dir, DiscoveryMode::Crawl { scope: vec![] })
            .output_dir(Some(docked.results_dir.parent().unwrap().join("crawl")))
            .layout(TableLayout::Compact)
            .build()
            .unwrap();
        let ledger = parse_config(
            &docked.results_dir,
            DiscoveryMode::Ledger {
                path: docked.ledger.clone(),
            },
        )
        .output_dir(Some(docked.results_dir.parent().unwrap().join("ledger")))
        .layout(TableLayout::Compact)
        .build()
        .unwrap();

        let from_crawl = run(&crawl, &ProgressReporter::new()).unwrap();
        let from_ledger = run(&ledger, &ProgressReporter::new()).unwrap();

        assert_eq!(from_crawl.rows, 1);
        assert_eq!(from_ledger.rows, 1);
        assert_eq!(
            read_rows(from_ledger.final_table.as_ref().unwrap()),
            vec![vec!["5R7Y+H", "L1", "1", "-6.2", "5R7Y+H/L1/out.pdbqt"]]
        );
    }

    #[test]
    fn truncated_artifact_is_a_miss_but_still_a_docking_success() {
        let (_dir, docked) = dock_run(
            "PDB_ID,X,Y,Z\nR1,1,2,3\n",
            &["R1.pdbqt"],
            &["L1.pdbqt", "L2.pdbqt", "L3.pdbqt"],
            TRUNCATES_L2,
        );
        assert_eq!(docked.tally.successes, 3);

        let config = parse_config(&docked.results_dir, DiscoveryMode::Crawl { scope: vec![] })
            .build()
            .unwrap();
        let parsed = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(parsed.targets, 3);
        assert_eq!(parsed.misses, 1);
        assert_eq!(parsed.rows, 3 - 1);
        assert_eq!(read_rows(parsed.final_table.as_ref().unwrap()).len(), 2);
    }

    #[test]
    fn crawl_and_ledger_replay_produce_identical_tables() {
        let (_dir, docked) = dock_run(
            "PDB_ID,X,Y,Z\nR1,1,2,3\nR2,4,5,6\n",
            &["R1.pdbqt", "R2.pdb"],
            &["L1.pdbqt", "L2.pdbqt", "L3.pdbqt"],
            SCORES_BY_RECEPTOR,
        );

        let crawl = parse_config(&docked.results_dir, DiscoveryMode::Crawl { scope: vec![] })
            .layout(TableLayout::Compact)
            .output_dir(Some(docked.results_dir.parent().unwrap().join("crawl")))
            .build()
            .unwrap();
        let ledger = parse_config(
            &docked.results_dir,
            DiscoveryMode::Ledger {
                path: docked.ledger.clone(),
            },
        )
        .layout(TableLayout::Compact)
        .output_dir(Some(docked.results_dir.parent().unwrap().join("ledger")))
        .build()
        .unwrap();

        let from_crawl = run(&crawl, &ProgressReporter::new()).unwrap();
        let from_ledger = run(&ledger, &ProgressReporter::new()).unwrap();

        assert_eq!(from_crawl.mode, "crawl");
        assert_eq!(from_ledger.mode, "ledger");
        assert_eq!(from_crawl.rows, 9);
        let crawl_rows = read_rows(from_crawl.final_table.as_ref().unwrap());
        let ledger_rows = read_rows(from_ledger.final_table.as_ref().unwrap());
        assert_eq!(crawl_rows, ledger_rows);

        let receptors_and_scores: Vec<_> = crawl_rows
            .iter()
            .map(|r| (r[0].as_str(), r[3].as_str()))
            .collect();
        assert_eq!(
            receptors_and_scores,
            vec![
                ("R1", "-6.2"),
                ("R1", "-6.2"),
                ("R1", "-6.2"),
                ("R2", "-9.1"),
                ("R2", "-9.1"),
                ("R2", "-9.1"),
                ("R2", "-8"),
                ("R2", "-8"),
                ("R2", "-8"),
            ]
        );
    }

    #[test]
    fn summary_report_can_drive_ledger_replay() {
        let (_dir, docked) = dock_run(
            "PDB_ID,X,Y,Z\nR1,1,2,3\n",
            &["R1.pdbqt"],
            &["L1.pdbqt", "L2.pdbqt"],
            SCORES_BY_RECEPTOR,
        );

        let config = parse_config(
            &docked.results_dir,
            DiscoveryMode::Ledger {
                path: docked.summary_report.clone(),
            },
        )
        .build()
        .unwrap();
        let parsed = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(parsed.targets, 2);
        assert_eq!(parsed.rows, 2);
    }

    #[test]
    fn ledger_with_one_success_and_noise_yields_one_target() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Docking_Results_demo");
        let artifact = root.join("R1/L1/out.pdbqt");
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, "REMARK VINA RESULT: -5.5\n").unwrap();
        let ledger = dir.path().join("run_log_demo.txt");
        fs::write(&ledger, "✅ L1 → R1.pdbqt\nPlease ignore this line\n").unwrap();

        let config = parse_config(&root, DiscoveryMode::Ledger { path: ledger })
            .live(true)
            .progress_log(true)
            .build()
            .unwrap();
        let parsed = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(parsed.targets, 1);
        assert_eq!(parsed.rows, 1);
        let live = fs::read_to_string(parsed.live_table.unwrap()).unwrap();
        assert!(live.starts_with("Receptor,Ligand,Pose,Binding_Affinity,OutFile,Run_Timestamp\n"));
        assert!(live.contains("R1,L1,1,-5.5,R1/L1/out.pdbqt,"));
        let log = fs::read_to_string(parsed.progress_log.unwrap()).unwrap();
        assert!(log.contains("Total targets: 1\n"));
    }

    #[test]
    fn no_targets_is_fatal_in_both_modes() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Docking_Results_empty");
        fs::create_dir_all(root.join("R1/L1")).unwrap();
        let ledger = dir.path().join("run_log.txt");
        fs::write(&ledger, "❌ L1 vs R1.pdbqt: crashed\n").unwrap();

        let crawl = parse_config(&root, DiscoveryMode::Crawl { scope: vec![] })
            .build()
            .unwrap();
        assert!(matches!(
            run(&crawl, &ProgressReporter::new()),
            Err(EngineError::NoTargets(_))
        ));

        let replay = parse_config(&root, DiscoveryMode::Ledger { path: ledger })
            .build()
            .unwrap();
        assert!(matches!(
            run(&replay, &ProgressReporter::new()),
            Err(EngineError::NoTargets(_))
        ));
    }

    #[test]
    fn skipping_the_sort_writes_no_final_table() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("res");
        let artifact = root.join("R1/L1/out.pdbqt");
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, "REMARK VINA RESULT: -5.5\n").unwrap();

        let config = parse_config(&root, DiscoveryMode::Crawl { scope: vec![] })
            .skip_sort(true)
            .live(true)
            .build()
            .unwrap();
        let parsed = run(&config, &ProgressReporter::new()).unwrap();

        assert!(parsed.final_table.is_none());
        assert!(parsed.live_table.is_some());
    }

    #[test]
    fn sorted_table_is_stable_under_resorting() {
        let (_dir, docked) = dock_run(
            "PDB_ID,X,Y,Z\nR2,1,2,3\nR1,4,5,6\n",
            &["R1.pdbqt", "R2.pdbqt"],
            &["L1.pdbqt", "L2.pdbqt"],
            SCORES_BY_RECEPTOR,
        );
        let config = parse_config(&docked.results_dir, DiscoveryMode::Crawl { scope: vec![] })
            .layout(TableLayout::Compact)
            .build()
            .unwrap();
        let parsed = run(&config, &ProgressReporter::new()).unwrap();

        let mut records: Vec<PoseRecord> = read_rows(parsed.final_table.as_ref().unwrap())
            .into_iter()
            .map(|r| PoseRecord {
                receptor: r[0].clone(),
                ligand: r[1].clone(),
                pose: r[2].parse().unwrap(),
                score: r[3].parse().unwrap(),
                out_file: PathBuf::from(&r[4]),
                run_timestamp: None,
            })
            .collect();
        let before = records.clone();
        sort_pose_records(&mut records);
        assert_eq!(records, before);
    }
}
