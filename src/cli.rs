//! CLI argument parsing and validation for RWPerf

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::format::parse_size;
use crate::plan::{self, PlanError};

/// Highest accepted total workload size.
pub const MAX_TOTAL_SIZE: u64 = 1 << 40;

/// Valid range for both the process and the thread count.
pub const COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=16;

const DEFAULT_SIZE: &str = "64mb";
const DEFAULT_MIN_SIZE: &str = "1b";

#[derive(Parser, Debug)]
#[command(name = "rwperf")]
#[command(version)]
#[command(
    about = "Filesystem read/write/delete throughput benchmark",
    long_about = "Writes, reads and deletes a set of randomly sized files at the given paths \
                  and prints a summary of the observed throughput. The default path is the \
                  current directory."
)]
pub struct Cli {
    /// Total number of bytes to write. Supports b, kb, mb, gb suffixes.
    #[arg(short = 's', long = "size", value_name = "SIZE", default_value = DEFAULT_SIZE)]
    pub size: String,

    /// Minimum size of one file.
    #[arg(long = "min-size", value_name = "SIZE", default_value = DEFAULT_MIN_SIZE)]
    pub min_size: String,

    /// Maximum size of one file. Defaults to size/16.
    #[arg(long = "max-size", value_name = "SIZE")]
    pub max_size: Option<String>,

    /// Number of OS processes to spread the workload across.
    #[arg(short = 'p', long = "processes", value_name = "N", default_value = "1")]
    pub processes: u32,

    /// Number of worker threads per process.
    #[arg(short = 't', long = "threads", value_name = "N", default_value = "1")]
    pub threads: u32,

    /// Seed for the workload and content generators.
    #[arg(long = "seed", value_name = "SEED", default_value = "1")]
    pub seed: u64,

    /// Do not delete the created files on exit.
    #[arg(long = "keep")]
    pub keep: bool,

    /// Emit results as protocol lines instead of aggregating them
    /// (set by the parent on child processes).
    #[arg(long = "subprocess", hide = true)]
    pub subprocess: bool,

    /// Directories to create the files in.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// Configuration errors reject the run before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse size argument: {0}")]
    MalformedSize(String),

    #[error("size must be at least 1 byte")]
    ZeroSize,

    #[error("total size {0} exceeds the limit of {MAX_TOTAL_SIZE} bytes")]
    SizeTooLarge(u64),

    #[error("min file size {min} exceeds max file size {max}")]
    MinExceedsMax { min: u64, max: u64 },

    #[error("{name} count {value} is out of range [1, 16]")]
    CountOutOfRange { name: &'static str, value: u32 },

    #[error("{} is no directory", .0.display())]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// A fully validated run configuration. The core consumes only these
/// values; the raw CLI surface never travels past this point.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub size: u64,
    pub min_size: u64,
    pub max_size: u64,
    pub processes: u32,
    pub threads: u32,
    pub seed: u64,
    pub keep: bool,
    pub subprocess: bool,
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Validate the raw arguments into a [`RunConfig`].
    ///
    /// Any failure here terminates the program before any file is touched;
    /// no partial run is attempted.
    pub fn validate(self) -> Result<RunConfig, ConfigError> {
        let size = parse_size_arg(&self.size)?;
        let min_size = parse_size_arg(&self.min_size)?.max(1);
        let max_size = match &self.max_size {
            Some(raw) => parse_size_arg(raw)?,
            None => (size / 16).max(1),
        };

        if size == 0 {
            return Err(ConfigError::ZeroSize);
        }

        if size > MAX_TOTAL_SIZE {
            return Err(ConfigError::SizeTooLarge(size));
        }

        if min_size > max_size {
            return Err(ConfigError::MinExceedsMax {
                min: min_size,
                max: max_size,
            });
        }

        plan::preflight(size, min_size, max_size)?;

        check_count("process", self.processes)?;
        check_count("thread", self.threads)?;

        let paths = if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths
        };

        for path in &paths {
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory(path.clone()));
            }
        }

        Ok(RunConfig {
            size,
            min_size,
            max_size,
            processes: self.processes,
            threads: self.threads,
            seed: self.seed,
            keep: self.keep,
            subprocess: self.subprocess,
            paths,
        })
    }
}

fn parse_size_arg(raw: &str) -> Result<u64, ConfigError> {
    parse_size(raw).ok_or_else(|| ConfigError::MalformedSize(raw.to_string()))
}

fn check_count(name: &'static str, value: u32) -> Result<(), ConfigError> {
    if COUNT_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::CountOutOfRange { name, value })
    }
}
