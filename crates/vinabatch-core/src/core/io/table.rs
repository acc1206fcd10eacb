use crate::core::models::pose::PoseRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const BASE_COLUMNS: [&str; 5] = ["Receptor", "Ligand", "Pose", "Binding_Affinity", "OutFile"];
const TIMESTAMP_COLUMN: &str = "Run_Timestamp";

/// Column set of a result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// `Receptor, Ligand, Pose, Binding_Affinity, OutFile`
    Compact,
    /// The compact columns plus `Run_Timestamp`.
    Full,
}

impl TableLayout {
    pub fn header(self) -> Vec<&'static str> {
        let mut header = BASE_COLUMNS.to_vec();
        if self == TableLayout::Full {
            header.push(TIMESTAMP_COLUMN);
        }
        header
    }

    fn row(self, record: &PoseRecord) -> Vec<String> {
        let mut row = vec![
            record.receptor.clone(),
            record.ligand.clone(),
            record.pose.to_string(),
            record.score.to_string(),
            record.out_file.display().to_string(),
        ];
        if self == TableLayout::Full {
            row.push(record.run_timestamp.clone().unwrap_or_default());
        }
        row
    }
}

fn write_rows(
    writer: &mut csv::Writer<File>,
    layout: TableLayout,
    records: &[PoseRecord],
) -> Result<(), csv::Error> {
    for record in records {
        writer.write_record(layout.row(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a complete result table, replacing any existing file.
pub fn write_table(
    path: &Path,
    layout: TableLayout,
    records: &[PoseRecord],
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(layout.header())?;
    write_rows(&mut writer, layout, records)
}

/// An incrementally appended result table.
///
/// The header is written and flushed on creation and every [`LiveTable::append`] flushes
/// complete rows under a single lock, so the file is a valid CSV at any moment.
pub struct LiveTable {
    path: PathBuf,
    layout: TableLayout,
    writer: Mutex<csv::Writer<File>>,
}

impl LiveTable {
    pub fn create(path: &Path, layout: TableLayout) -> Result<Self, csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(layout.header())?;
        writer.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            layout,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, records: &[PoseRecord]) -> Result<(), csv::Error> {
        if records.is_empty() {
            return Ok(());
        }
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        write_rows(&mut writer, self.layout, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn record(ligand: &str, pose: usize, score: f64) -> PoseRecord {
        PoseRecord {
            receptor: "R1".into(),
            ligand: ligand.into(),
            pose,
            score,
            out_file: PathBuf::from(format!("R1/{ligand}/out.pdbqt")),
            run_timestamp: Some("2024-05-01_12-00-00".into()),
        }
    }

    #[test]
    fn write_table_emits_full_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("final.csv");

        write_table(&path, TableLayout::Full, &[record("L1", 1, -7.5)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Receptor,Ligand,Pose,Binding_Affinity,OutFile,Run_Timestamp\n\
             R1,L1,1,-7.5,R1/L1/out.pdbqt,2024-05-01_12-00-00\n"
        );
    }

    #[test]
    fn write_table_compact_layout_omits_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("final.csv");

        write_table(&path, TableLayout::Compact, &[record("L2", 3, -6.0)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Receptor,Ligand,Pose,Binding_Affinity,OutFile\nR1,L2,3,-6,R1/L2/out.pdbqt\n"
        );
    }

    #[test]
    fn live_table_is_readable_after_creation_and_each_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("live.csv");

        let table = LiveTable::create(&path, TableLayout::Compact).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);

        table.append(&[record("L1", 1, -7.5), record("L1", 2, -7.0)]).unwrap();
        table.append(&[]).unwrap();

        let text = fs::read_to_string(table.path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("R1,L1,2,-7,R1/L1/out.pdbqt\n"));
    }

    #[test]
    fn live_table_never_interleaves_rows_from_concurrent_writers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("live.csv");
        let table = Arc::new(LiveTable::create(&path, TableLayout::Full).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    let ligand = format!("L{i}");
                    let batch: Vec<_> = (1..=25).map(|p| record(&ligand, p, -1.0)).collect();
                    table.append(&batch).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 200);
        assert!(rows.iter().all(|row| row.len() == 6));
    }
}
