//! Fixed-size worker pool over a shared FIFO task queue
//!
//! A bounded set of worker threads drains one unbounded channel of boxed
//! jobs. Submission never blocks; the queue grows with available memory and
//! carries no priorities, no cancellation and no backpressure. The only
//! blocking synchronization point exposed to callers is [`Pool::shutdown`],
//! which stops intake and waits for a full drain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};
use tracing::{debug, trace};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Interval at which `shutdown` re-checks the outstanding-job count.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A fixed number of worker threads pulling from one shared FIFO queue.
pub struct Pool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    outstanding: Arc<AtomicUsize>,
}

impl Pool {
    /// Spawn `threads` workers, all waiting on the same queue.
    pub fn new(threads: usize) -> Self {
        assert!(threads > 0, "pool needs at least one worker");

        let (sender, receiver) = unbounded::<Job>();
        let outstanding = Arc::new(AtomicUsize::new(0));

        let workers = (0..threads)
            .map(|index| {
                let receiver: Receiver<Job> = receiver.clone();
                let outstanding = Arc::clone(&outstanding);

                thread::Builder::new()
                    .name(format!("rwperf-worker-{index}"))
                    .spawn(move || {
                        trace!(worker = index, "worker started");
                        for job in receiver.iter() {
                            job();
                            outstanding.fetch_sub(1, Ordering::Release);
                        }
                        trace!(worker = index, "worker finished");
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
            outstanding,
        }
    }

    /// Enqueue a job without blocking the caller.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.outstanding.fetch_add(1, Ordering::Acquire);
        self.sender
            .as_ref()
            .expect("pool already shut down")
            .send(Box::new(job))
            .expect("worker threads gone");
    }

    /// Jobs submitted but not yet completed.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Stop accepting work and block until the queue is drained and every
    /// in-flight job has completed. Termination is polled at a coarse
    /// interval, so shutdown latency is bounded by that interval rather
    /// than being instantaneous.
    pub fn shutdown(&mut self) {
        // Closing the channel lets workers exit once it is empty.
        drop(self.sender.take());

        while self.outstanding() > 0 {
            trace!(outstanding = self.outstanding(), "waiting for pool drain");
            thread::sleep(DRAIN_POLL_INTERVAL);
        }

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }

        debug!("pool drained and joined");
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_executes_every_job() {
        let counter = Arc::new(AtomicU64::new(0));
        let mut pool = Pool::new(4);

        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }

        pool.shutdown();
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn test_shutdown_waits_for_in_flight_jobs() {
        let done = Arc::new(AtomicU64::new(0));
        let mut pool = Pool::new(2);

        for _ in 0..4 {
            let done = Arc::clone(&done);
            pool.execute(move || {
                thread::sleep(Duration::from_millis(50));
                done.fetch_add(1, Ordering::Relaxed);
            });
        }

        pool.shutdown();
        assert_eq!(done.load(Ordering::Relaxed), 4);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_single_worker_preserves_fifo_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pool = Pool::new(1);

        for index in 0..10 {
            let order = Arc::clone(&order);
            pool.execute(move || {
                order.lock().unwrap().push(index);
            });
        }

        pool.shutdown();
        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_submission_does_not_block() {
        // Far more jobs than workers; execute() must return immediately.
        let mut pool = Pool::new(1);
        for _ in 0..10_000 {
            pool.execute(|| {});
        }
        pool.shutdown();
    }
}
