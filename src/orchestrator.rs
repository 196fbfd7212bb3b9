//! Multi-process fan-out over the stdio line protocol
//!
//! Splits the byte budget across N sibling instances of this program, wires
//! each child's stdout through the protocol parser into the shared result
//! channel and relays each child's stderr verbatim. Both streams are drained
//! by dedicated threads running concurrently with the child, so a full pipe
//! buffer can never deadlock a run. Children that fail to spawn or exit
//! non-zero are reported and skipped; siblings are unaffected.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

use anyhow::Context;
use crossbeam::channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::cli::RunConfig;
use crate::result::{is_finish_line, is_result_line, OpResult};

/// Bytes each of `processes` children receives: floor division of the
/// total. The remainder of up to `processes - 1` bytes is dropped.
pub fn share(total_size: u64, processes: u32) -> u64 {
    total_size / u64::from(processes)
}

/// Seeds for `processes` children, drawn in order from a generator seeded
/// with the parent seed: reproducible from the parent seed, mutually
/// distinct with overwhelming probability.
pub fn child_seeds(parent_seed: u64, processes: u32) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(parent_seed);
    (0..processes).map(|_| rng.gen()).collect()
}

/// Command line for one child: the same program, one process, the share of
/// the budget, pass-through rendering.
fn child_args(config: &RunConfig, share: u64, seed: u64) -> Vec<String> {
    let mut args = vec![
        "--size".to_string(),
        share.to_string(),
        "--min-size".to_string(),
        config.min_size.to_string(),
        "--max-size".to_string(),
        config.max_size.to_string(),
        "--processes".to_string(),
        "1".to_string(),
        "--threads".to_string(),
        config.threads.to_string(),
        "--seed".to_string(),
        seed.to_string(),
        "--subprocess".to_string(),
    ];

    if config.keep {
        args.push("--keep".to_string());
    }

    for path in &config.paths {
        args.push(path.display().to_string());
    }

    args
}

struct ChildRun {
    index: u32,
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

/// Launch all children and aggregate their result streams into `results`.
///
/// Returns once every child has exited and both of its streams have been
/// fully drained. Non-zero child exits are reported but do not fail the
/// run.
pub fn run(config: &RunConfig, results: &Sender<OpResult>) -> anyhow::Result<()> {
    let program = std::env::current_exe().context("cannot locate own executable")?;
    let share = share(config.size, config.processes);
    let seeds = child_seeds(config.seed, config.processes);

    let mut children = Vec::new();

    for (index, seed) in seeds.into_iter().enumerate() {
        let index = index as u32 + 1;
        let args = child_args(config, share, seed);

        debug!(child = index, seed, share, "spawning child");

        let spawned = Command::new(&program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(error) => {
                eprintln!("failed to spawn child process {index}: {error}");
                continue;
            }
        };

        let mut readers = Vec::new();

        if let Some(stdout) = child.stdout.take() {
            let results = results.clone();
            readers.push(spawn_reader("rwperf-child-out", stdout, move |line| {
                consume_protocol_line(&line, &results);
            }));
        }

        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader("rwperf-child-err", stderr, |line| {
                eprintln!("{line}");
            }));
        }

        children.push(ChildRun {
            index,
            child,
            readers,
        });
    }

    for mut run in children {
        match run.child.wait() {
            Ok(status) if !status.success() => {
                eprintln!("child process {} exited with {status}", run.index);
            }
            Ok(_) => {}
            Err(error) => {
                eprintln!("failed to wait for child process {}: {error}", run.index);
            }
        }

        for reader in run.readers {
            let _ = reader.join();
        }

        debug!(child = run.index, "child drained");
    }

    Ok(())
}

/// Classify one line of a child's stdout: results feed the aggregator,
/// the finish sentinel is dropped, anything else is relayed verbatim to
/// the diagnostic stream. A malformed result line is reported, not fatal.
fn consume_protocol_line(line: &str, results: &Sender<OpResult>) {
    if is_finish_line(line) {
        return;
    }

    if !is_result_line(line) {
        eprintln!("{line}");
        return;
    }

    match OpResult::parse_line(line) {
        Ok(result) => {
            let _ = results.send(result);
        }
        Err(error) => {
            eprintln!("unparseable result line from child ({error}): {line}");
        }
    }
}

fn spawn_reader<R, F>(name: &str, stream: R, mut consume: F) -> JoinHandle<()>
where
    R: Read + Send + 'static,
    F: FnMut(String) + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let reader = BufReader::new(stream);
            for line in reader.lines() {
                match line {
                    Ok(line) => consume(line),
                    Err(error) => {
                        eprintln!("lost child stream: {error}");
                        break;
                    }
                }
            }
        })
        .expect("failed to spawn stream reader thread")
}
