use regex::Regex;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

/// Matches one scored pose, e.g. `REMARK VINA RESULT:    -7.5      0.000      0.000`.
static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*REMARK\s+VINA\s+RESULT:\s+([-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)")
        .expect("score line pattern is valid")
});

/// A scored pose as it appears in a result artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPose {
    /// 1-based position among the file's score lines.
    pub index: usize,
    pub score: f64,
}

/// Extracts the score of a single line, if it is a score line.
pub fn parse_score_line(line: &str) -> Option<f64> {
    SCORE_LINE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Reads every score line from a result artifact, in file order.
///
/// Invalid UTF-8 is replaced rather than rejected, and reading stops quietly at the
/// first I/O error, keeping the poses found so far.
pub fn read_poses(reader: impl BufRead) -> Vec<ScoredPose> {
    let mut poses = Vec::new();
    for line in reader.split(b'\n') {
        let Ok(bytes) = line else {
            break;
        };
        let text = String::from_utf8_lossy(&bytes);
        if let Some(score) = parse_score_line(&text) {
            poses.push(ScoredPose {
                index: poses.len() + 1,
                score,
            });
        }
    }
    poses
}

pub fn read_poses_from_path(path: &Path) -> io::Result<Vec<ScoredPose>> {
    let file = std::fs::File::open(path)?;
    Ok(read_poses(BufReader::new(file)))
}
