//! Single-process pipeline: plan, execute, report results
//!
//! Drives the planner, worker pool and executor for one process's share of
//! the workload. Reads and deletes are enqueued only after the entire write
//! set, preserving the phase ordering of the plan. With more than one
//! worker, FIFO dequeue order still allows a read to start before the write
//! of the same file has finished; there is deliberately no completion
//! barrier between the phases.

use crossbeam::channel::Sender;
use tracing::debug;

use crate::cli::RunConfig;
use crate::executor;
use crate::plan::{self, PlanError};
use crate::pool::Pool;
use crate::result::OpResult;

/// Run the full plan-execute pipeline for `config`, delivering every
/// result into `results`. Blocks until all tasks have completed.
pub fn run(config: &RunConfig, results: &Sender<OpResult>) -> Result<(), PlanError> {
    let plan = plan::build(
        config.size,
        config.min_size,
        config.max_size,
        config.seed,
        &config.paths,
    )?;

    debug!(
        writes = plan.writes.len(),
        bytes = plan.planned_bytes(),
        threads = config.threads,
        "executing workload"
    );

    let mut pool = Pool::new(config.threads as usize);

    for task in plan.writes {
        let results = results.clone();
        pool.execute(move || {
            let _ = results.send(executor::write(&task.file, task.seed, task.size));
        });
    }

    for file in plan.reads {
        let results = results.clone();
        pool.execute(move || {
            let _ = results.send(executor::read(&file));
        });
    }

    if !config.keep {
        for file in plan.deletes {
            let results = results.clone();
            pool.execute(move || {
                let _ = results.send(executor::delete(&file));
            });
        }
    }

    pool.shutdown();

    Ok(())
}
