use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "vinabatch - Run AutoDock Vina over every receptor x ligand pair of a campaign and aggregate the scored poses into one table.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dock every ligand against every receptor listed in the parameter table.
    Dock(DockArgs),
    /// Collect the scored poses of a finished (or interrupted) docking run into a CSV table.
    Parse(ParseArgs),
}

/// Arguments for the `dock` subcommand.
#[derive(Args, Debug, Clone)]
pub struct DockArgs {
    // --- Inputs ---
    /// Directory holding the receptor structures.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub receptors: PathBuf,

    /// Directory holding the ligand files.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub ligands: PathBuf,

    /// CSV parameter table with PDB_ID, X, Y, Z and an optional SIZE column.
    #[arg(short = 't', long = "centers", required = true, value_name = "CSV")]
    pub parameter_table: PathBuf,

    /// Optional TOML configuration file with docking defaults.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Overrides ---
    /// Number of binding modes requested per job.
    #[arg(short = 'n', long = "poses", value_name = "INT")]
    pub num_modes: Option<u32>,

    /// CPU units held back from the docking pool.
    #[arg(long, value_name = "INT")]
    pub reserve_cores: Option<usize>,

    /// Run this many concurrent jobs instead of sizing from the host, capped at the
    /// schedulable units.
    #[arg(short = 'w', long, value_name = "INT")]
    pub workers: Option<usize>,

    /// Search box edge length (Angstrom) for rows without a SIZE value.
    #[arg(long, value_name = "FLOAT")]
    pub box_size: Option<f64>,

    /// Docking executable. Falls back to the config file, then $VINA_EXE, then `vina`.
    #[arg(long = "vina", value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Directory receiving the results tree and the run reports.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the `parse` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Results root of a docking run (`Docking_Results_<tag>`).
    #[arg(short, long, required = true, value_name = "DIR")]
    pub results: PathBuf,

    /// Replay the success lines of a run log (or summary report) instead of crawling.
    #[arg(long, value_name = "PATH", conflicts_with = "scope")]
    pub from_log: Option<PathBuf>,

    /// Restrict crawling to these receptor subdirectories. Can be used multiple times.
    #[arg(short, long, value_name = "NAME")]
    pub scope: Vec<String>,

    /// Result file to look for: an exact name, or `*.<ext>` to match by extension.
    #[arg(long, default_value = "out.pdbqt", value_name = "NAME")]
    pub name: String,

    /// Number of concurrent readers. Defaults to twice the available CPU units, at most 32.
    #[arg(short = 'w', long, value_name = "INT")]
    pub workers: Option<usize>,

    /// Append every parsed record to a live CSV while parsing.
    #[arg(long)]
    pub live: bool,

    /// Write a parse progress log with found files and heartbeats.
    #[arg(long = "log")]
    pub progress_log: bool,

    /// Emit a heartbeat every this many processed files.
    #[arg(long, default_value_t = 1000, value_name = "INT")]
    pub heartbeat: usize,

    /// Skip writing the final sorted table.
    #[arg(long)]
    pub no_sort: bool,

    /// Drop the Run_Timestamp column from the output tables.
    #[arg(long)]
    pub fast: bool,

    /// Directory receiving the output tables. Defaults to the parent of the results root.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dock_requires_the_three_inputs() {
        let result = Cli::try_parse_from(["vinabatch", "dock", "-r", "rec", "-l", "lig"]);
        assert!(result.is_err());
    }

    #[test]
    fn dock_parses_inputs_and_overrides() {
        let cli = Cli::try_parse_from([
            "vinabatch",
            "-vv",
            "dock",
            "--receptors",
            "Receptors_Kinases",
            "--ligands",
            "Ligands_CPD1_Ligands",
            "--centers",
            "centers.csv",
            "--poses",
            "9",
            "--reserve-cores",
            "2",
            "--vina",
            "/opt/vina",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Dock(args) = cli.command else {
            panic!("expected dock subcommand");
        };
        assert_eq!(args.receptors, PathBuf::from("Receptors_Kinases"));
        assert_eq!(args.parameter_table, PathBuf::from("centers.csv"));
        assert_eq!(args.num_modes, Some(9));
        assert_eq!(args.reserve_cores, Some(2));
        assert_eq!(args.executable, Some(PathBuf::from("/opt/vina")));
        assert_eq!(args.workers, None);
        assert_eq!(args.box_size, None);
    }

    #[test]
    fn parse_defaults_and_flags() {
        let cli = Cli::try_parse_from([
            "vinabatch", "parse", "-r", "results", "--live", "--log", "--fast", "-s", "R1", "-s",
            "R2",
        ])
        .unwrap();

        let Commands::Parse(args) = cli.command else {
            panic!("expected parse subcommand");
        };
        assert_eq!(args.name, "out.pdbqt");
        assert_eq!(args.heartbeat, 1000);
        assert!(args.live && args.progress_log && args.fast);
        assert!(!args.no_sort);
        assert_eq!(args.scope, vec!["R1".to_string(), "R2".to_string()]);
        assert_eq!(args.from_log, None);
    }

    #[test]
    fn parse_ledger_mode_conflicts_with_scope() {
        let result = Cli::try_parse_from([
            "vinabatch",
            "parse",
            "-r",
            "results",
            "--from-log",
            "run_log.txt",
            "-s",
            "R1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["vinabatch", "-q", "-v", "parse", "-r", "results"]);
        assert!(result.is_err());
    }
}
