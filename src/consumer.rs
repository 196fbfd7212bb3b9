//! Result consumption: aggregation, pass-through rendering, collection
//!
//! All produced results funnel into exactly one [`Collector`] thread that
//! owns a [`ResultConsumer`]. Worker threads and the orchestrator's
//! protocol readers only ever hold channel senders, so the per-operation
//! accumulators have a single mutation point and need no locking.

use std::fmt::Write as _;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Sender};
use tracing::debug;

use crate::cli::RunConfig;
use crate::format::{format_size, format_throughput};
use crate::result::{OpResult, Operation};

/// Consumes each produced result exactly once.
pub trait ResultConsumer: Send {
    fn consume(&mut self, result: OpResult);
}

/// Running totals for one operation kind.
#[derive(Debug, Default, Clone)]
pub struct Average {
    bytes: u64,
    duration: f64,
    count: u64,
}

impl Average {
    fn consume(&mut self, result: &OpResult) {
        self.bytes += result.size;
        self.duration += result.duration;
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Bytes per second, defined only once any duration has accumulated.
    pub fn throughput(&self) -> Option<f64> {
        (self.duration > 0.0).then(|| self.bytes as f64 / self.duration)
    }

    fn render(&self) -> String {
        match self.throughput() {
            Some(value) => format_throughput(value),
            None => "-".to_string(),
        }
    }
}

/// In-process averaging consumer: accumulates every result it receives,
/// regardless of whether it came from local execution or from a child's
/// protocol stream, and renders the final report.
pub struct AverageConsumer {
    config: RunConfig,
    writes: Average,
    reads: Average,
    deletes: Average,
}

impl AverageConsumer {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            config: config.clone(),
            writes: Average::default(),
            reads: Average::default(),
            deletes: Average::default(),
        }
    }

    pub fn writes(&self) -> &Average {
        &self.writes
    }

    pub fn reads(&self) -> &Average {
        &self.reads
    }

    pub fn deletes(&self) -> &Average {
        &self.deletes
    }

    /// Render the final report: configuration echo, file counts and
    /// per-operation throughput.
    pub fn render(&self) -> String {
        let config = &self.config;
        let mut out = String::new();

        let _ = writeln!(out, "RWPerf Results");
        let _ = writeln!(out, "==============");
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<16}{}", "Total size:", format_size(config.size));
        let _ = writeln!(out, "{:<16}{}", "Min file size:", format_size(config.min_size));
        let _ = writeln!(out, "{:<16}{}", "Max file size:", format_size(config.max_size));
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<16}{}", "Processes:", config.processes);
        let _ = writeln!(out, "{:<16}{}", "Threads:", config.threads);
        let _ = writeln!(out, "{:<16}{}", "Seed:", config.seed);
        let _ = writeln!(out, "{:<16}{}", "Delete files:", !config.keep);
        let _ = writeln!(out);

        for (index, path) in config.paths.iter().enumerate() {
            let label = if index == 0 { "Paths:" } else { "" };
            let _ = writeln!(out, "{:<16}{}", label, path.display());
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{:<16}{} files", "Written:", self.writes.count());
        let _ = writeln!(out, "{:<16}{} files", "Read:", self.reads.count());
        let _ = writeln!(out, "{:<16}{} files", "Deleted:", self.deletes.count());
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<16}{}", "Write avg:", self.writes.render());
        let _ = writeln!(out, "{:<16}{}", "Read avg:", self.reads.render());
        let _ = writeln!(out, "{:<16}{}", "Delete avg:", self.deletes.render());

        out
    }
}

impl ResultConsumer for AverageConsumer {
    fn consume(&mut self, result: OpResult) {
        match result.operation {
            Operation::Write => self.writes.consume(&result),
            Operation::Read => self.reads.consume(&result),
            Operation::Delete => self.deletes.consume(&result),
        }
    }
}

/// Child-mode consumer: serializes each result to a protocol line on
/// stdout for the parent to aggregate. [`PassthroughConsumer::finish`]
/// prints the terminal sentinel.
#[derive(Debug, Default)]
pub struct PassthroughConsumer {
    emitted: u64,
}

impl PassthroughConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the terminal sentinel line.
    pub fn finish(&self) {
        debug!(emitted = self.emitted, "passthrough finished");
        println!("FINISHED");
    }
}

impl ResultConsumer for PassthroughConsumer {
    fn consume(&mut self, result: OpResult) {
        println!("{}", result.to_line());
        self.emitted += 1;
    }
}

/// The single aggregation point: one thread owning a consumer, fed over an
/// unbounded channel by any number of producers.
pub struct Collector<C: ResultConsumer + 'static> {
    sender: Option<Sender<OpResult>>,
    handle: JoinHandle<C>,
}

impl<C: ResultConsumer + 'static> Collector<C> {
    /// Spawn the collector thread around `consumer`.
    pub fn spawn(mut consumer: C) -> Self {
        let (sender, receiver) = unbounded::<OpResult>();

        let handle = thread::Builder::new()
            .name("rwperf-collector".to_string())
            .spawn(move || {
                let mut collected = 0u64;
                for result in receiver.iter() {
                    consumer.consume(result);
                    collected += 1;
                }
                debug!(collected, "collector drained");
                consumer
            })
            .expect("failed to spawn collector thread");

        Self {
            sender: Some(sender),
            handle,
        }
    }

    /// A sender feeding this collector. Clone freely; the collector stops
    /// once every clone has been dropped.
    pub fn sender(&self) -> Sender<OpResult> {
        self.sender
            .as_ref()
            .expect("collector already finished")
            .clone()
    }

    /// Drop this side's sender, wait for the channel to drain and return
    /// the consumer with its accumulated state.
    pub fn finish(mut self) -> C {
        drop(self.sender.take());
        self.handle.join().expect("collector thread panicked")
    }
}
