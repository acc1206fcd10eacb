use std::cmp::Ordering;
use std::path::PathBuf;

/// One scored pose extracted from a result artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseRecord {
    pub receptor: String,
    pub ligand: String,
    /// 1-based index of the pose in file order.
    pub pose: usize,
    /// Binding affinity in kcal/mol; lower is better.
    pub score: f64,
    /// Result artifact path, relative to the results root when possible.
    pub out_file: PathBuf,
    pub run_timestamp: Option<String>,
}

/// Sorts records into the final table order.
///
/// Ordering is by receptor, then score ascending, with ligand, pose and result file as
/// tie-breaks so the result depends only on record content and never on discovery or
/// completion order.
pub fn sort_pose_records(records: &mut [PoseRecord]) {
    records.sort_by(compare_pose_records);
}

fn compare_pose_records(a: &PoseRecord, b: &PoseRecord) -> Ordering {
    // Level 1: receptor identifier.
    a.receptor
        .cmp(&b.receptor)
        // Level 2: binding score, best (most negative) first.
        .then_with(|| a.score.total_cmp(&b.score))
        // Level 3: ligand identifier, then pose index, for ties.
        .then_with(|| a.ligand.cmp(&b.ligand))
        .then_with(|| a.pose.cmp(&b.pose))
        // Level 4: result file, when one ligand id was written to two places.
        .then_with(|| a.out_file.cmp(&b.out_file))
}
