use super::job::Job;

/// The recorded result of executing one job.
///
/// Success is decided purely by the docking program's exit status. Whether the
/// result artifact actually contains poses is a separate question answered later by
/// the result parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,
    pub ligand_id: String,
    pub receptor_id: String,
    pub receptor_file_name: String,
}

impl JobOutcome {
    pub fn succeeded(job: &Job) -> Self {
        Self {
            success: true,
            message: String::new(),
            ligand_id: job.ligand_id.clone(),
            receptor_id: job.receptor_id.clone(),
            receptor_file_name: job.receptor_file_name(),
        }
    }

    pub fn failed(job: &Job, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ligand_id: job.ligand_id.clone(),
            receptor_id: job.receptor_id.clone(),
            receptor_file_name: job.receptor_file_name(),
        }
    }
}

/// Running totals of a batch, in completion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub total: usize,
    pub done: usize,
    pub successes: usize,
    pub failures: usize,
}

impl BatchTally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &JobOutcome) {
        self.done += 1;
        if outcome.success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.done == self.total
    }
}
