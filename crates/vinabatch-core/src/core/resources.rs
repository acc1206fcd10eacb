use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// Environment variables through which batch schedulers announce a CPU allocation.
///
/// `LSB_DJOB_NUMPROC` is set by LSF, `SLURM_CPUS_PER_TASK` by Slurm.
pub const ALLOCATION_ENV_VARS: [&str; 2] = ["LSB_DJOB_NUMPROC", "SLURM_CPUS_PER_TASK"];

/// Upper bound on the default result-parsing pool.
pub const MAX_DEFAULT_PARSE_WORKERS: usize = 32;

/// Usable parallelism of the current host.
///
/// The schedulable count comes from [`std::thread::available_parallelism`], which
/// honours CPU affinity masks and cgroup quotas rather than reporting raw hardware
/// threads. A scheduler allocation smaller than that count caps it further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSizer {
    schedulable: usize,
    allocation: Option<usize>,
}

impl ResourceSizer {
    pub fn detect() -> Self {
        let schedulable = match std::thread::available_parallelism() {
            Ok(n) => Some(n.get()),
            Err(e) => {
                warn!("Could not detect schedulable CPU units ({}); assuming 1.", e);
                None
            }
        };
        let sizer = Self::from_parts(schedulable, allocation_from_env(|key| std::env::var(key).ok()));
        debug!(
            schedulable = sizer.schedulable,
            allocation = ?sizer.allocation,
            "Detected host resources."
        );
        sizer
    }

    /// Builds a sizer from already-detected values. `None` for the schedulable count
    /// means detection failed and falls back to a single unit.
    pub fn from_parts(schedulable: Option<usize>, allocation: Option<usize>) -> Self {
        Self {
            schedulable: schedulable.filter(|&n| n > 0).unwrap_or(1),
            allocation: allocation.filter(|&n| n > 0),
        }
    }

    /// Units this process may use: the schedulable count, capped by any allocation.
    pub fn available_units(&self) -> usize {
        let units = match self.allocation {
            Some(limit) => self.schedulable.min(limit),
            None => self.schedulable,
        };
        units.max(1)
    }

    /// Docking workers after holding back `reserve` units, never fewer than one.
    pub fn worker_count(&self, reserve: usize) -> usize {
        self.available_units().saturating_sub(reserve).max(1)
    }

    /// Default size of the I/O-bound result parsing pool.
    pub fn parse_worker_count(&self) -> usize {
        (self.available_units() * 2).clamp(1, MAX_DEFAULT_PARSE_WORKERS)
    }

    pub fn allocation(&self) -> Option<usize> {
        self.allocation
    }
}

/// Reads the smallest valid positive allocation among [`ALLOCATION_ENV_VARS`].
pub fn allocation_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<usize> {
    ALLOCATION_ENV_VARS
        .iter()
        .filter_map(|key| {
            let raw = lookup(key)?;
            match raw.trim().parse::<NonZeroUsize>() {
                Ok(n) => Some(n.get()),
                Err(_) => {
                    warn!("Ignoring non-numeric {}={:?}.", key, raw);
                    None
                }
            }
        })
        .min()
}
