//! Deterministic workload planning
//!
//! Decomposes a total byte budget into write tasks with pseudo-random sizes
//! and target directories, plus derived read and delete tasks over the same
//! files. Planning is eager and side-effect free: the full plan exists
//! before any file is touched, and two plans built from identical inputs
//! (including the seed) are identical.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

/// Upper bound on the estimated number of planned files. Bounds planner
/// memory and pool scheduling overhead.
pub const MAX_PLANNED_FILES: u64 = 1_000_000;

/// A deferred write of `size` pseudo-random bytes, regenerable from `seed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTask {
    pub file: PathBuf,
    pub seed: u64,
    pub size: u64,
}

/// The full ordered task set derived from one workload request.
///
/// Reads and deletes reference the same files as the writes, one each per
/// write, but live in separate lists: they are only submitted for execution
/// after the entire write set has been enqueued.
#[derive(Debug, Clone, Default)]
pub struct WorkloadPlan {
    pub writes: Vec<WriteTask>,
    pub reads: Vec<PathBuf>,
    pub deletes: Vec<PathBuf>,
}

impl WorkloadPlan {
    /// Sum of all planned write sizes. At most the requested total, short
    /// of it by less than the minimum file size.
    pub fn planned_bytes(&self) -> u64 {
        self.writes.iter().map(|task| task.size).sum()
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(
        "estimated file count {estimated} exceeds the limit of {MAX_PLANNED_FILES} \
         (total size {total_size}, average file size {average})"
    )]
    TooManyFiles {
        estimated: u64,
        total_size: u64,
        average: u64,
    },

    #[error("no candidate directories")]
    NoPaths,
}

/// Reject workloads whose estimated file count exceeds [`MAX_PLANNED_FILES`].
///
/// Evaluated once, before planning begins, using the average of the size
/// bounds as the expected file size.
pub fn preflight(total_size: u64, min_size: u64, max_size: u64) -> Result<(), PlanError> {
    let average = ((min_size + max_size) / 2).max(1);
    let estimated = total_size / average;

    if estimated > MAX_PLANNED_FILES {
        return Err(PlanError::TooManyFiles {
            estimated,
            total_size,
            average,
        });
    }

    Ok(())
}

/// File name for a write task, derived from its content seed.
///
/// The fixed-width hex encoding keeps names from identically seeded runs
/// reproducible and concurrently planned tasks collision-free.
pub fn file_name(seed: u64) -> String {
    format!("rwperf#{seed:016x}.dat")
}

/// Build the workload plan for a byte budget.
///
/// Repeatedly draws a file size uniformly from `[min_size, effective_max]`
/// where `effective_max = min(remaining, max_size)`, a target directory
/// uniformly from `paths`, and a per-file content seed, until the budget is
/// exhausted. When the clamped maximum falls below `min_size` the final
/// sliver of budget is dropped rather than forced into an undersized file,
/// so the planned total may undershoot `total_size` by up to `min_size - 1`.
pub fn build(
    total_size: u64,
    min_size: u64,
    max_size: u64,
    seed: u64,
    paths: &[PathBuf],
) -> Result<WorkloadPlan, PlanError> {
    if paths.is_empty() {
        return Err(PlanError::NoPaths);
    }

    preflight(total_size, min_size, max_size)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut plan = WorkloadPlan::default();
    let mut remaining = total_size;

    loop {
        let effective_max = remaining.min(max_size);

        if effective_max < min_size || remaining == 0 {
            break;
        }

        let size = rng.gen_range(min_size..=effective_max);
        let path = &paths[rng.gen_range(0..paths.len())];
        let file_seed: u64 = rng.gen();
        let file = path.join(file_name(file_seed));

        plan.reads.push(file.clone());
        plan.deletes.push(file.clone());
        plan.writes.push(WriteTask {
            file,
            seed: file_seed,
            size,
        });

        remaining -= size;
    }

    debug!(
        files = plan.writes.len(),
        planned_bytes = plan.planned_bytes(),
        dropped = remaining,
        "workload planned"
    );

    Ok(plan)
}
