use crate::core::models::job::Job;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Serializes a job into the `key = value` config format read by the docking program.
///
/// The box is cubic: all three `size_*` keys carry the job's box size.
pub fn write_job_config(job: &Job, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "receptor = {}", job.receptor_file.display())?;
    writeln!(writer, "ligand = {}", job.ligand_file.display())?;
    writeln!(writer, "center_x = {}", job.center.x)?;
    writeln!(writer, "center_y = {}", job.center.y)?;
    writeln!(writer, "center_z = {}", job.center.z)?;
    writeln!(writer, "size_x = {}", job.box_size)?;
    writeln!(writer, "size_y = {}", job.box_size)?;
    writeln!(writer, "size_z = {}", job.box_size)?;
    writeln!(writer, "num_modes = {}", job.num_modes)?;
    writeln!(writer, "out = {}", job.paths.output.display())?;
    Ok(())
}

pub fn write_job_config_to_path(job: &Job, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_job_config(job, &mut writer)?;
    writer.flush()
}
