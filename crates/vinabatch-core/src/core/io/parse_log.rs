use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Plain-text progress log of a parse run.
///
/// ```text
/// Parse started 2024-05-01_12-00-00
/// Total targets: 3
///
/// [FOUND] /res/R1/L1/out.pdbqt  poses=9
/// [HEARTBEAT] processed=2/3 (66%)  hits=1
/// [DONE] processed=3/3  hits=2
/// ```
pub struct ParseLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ParseLog {
    pub fn create(path: &Path, started: &str, total: usize) -> io::Result<Self> {
        let mut file = File::create(path)?;
        write!(file, "Parse started {}\nTotal targets: {}\n\n", started, total)?;
        file.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn found(&self, artifact: &Path, poses: usize) -> io::Result<()> {
        self.line(&format!("[FOUND] {}  poses={}", artifact.display(), poses))
    }

    pub fn heartbeat(&self, processed: usize, total: usize, hits: usize) -> io::Result<()> {
        self.line(&format!(
            "[HEARTBEAT] processed={}/{} ({}%)  hits={}",
            processed,
            total,
            percent(processed, total),
            hits
        ))
    }

    pub fn done(&self, processed: usize, total: usize, hits: usize) -> io::Result<()> {
        self.line(&format!(
            "[DONE] processed={}/{}  hits={}",
            processed, total, hits
        ))
    }

    fn line(&self, text: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(format!("{}\n", text).as_bytes())?;
        file.flush()
    }
}

pub fn percent(processed: usize, total: usize) -> usize {
    processed * 100 / total.max(1)
}
