//! Operation results and the child-to-parent line protocol
//!
//! Every executed file operation produces exactly one immutable [`OpResult`].
//! In multi-process runs, child processes serialize each result to a single
//! `RESULT | …` line on stdout; the parent parses those lines back into
//! results and feeds them to the same aggregator used for local execution.
//! Only the bare file name crosses the process boundary, so a parsed result
//! carries the name rather than an absolute path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Prefix of a serialized result line.
pub const RESULT_PREFIX: &str = "RESULT";

/// Prefix of the terminal sentinel line a child prints after its last
/// result. Carries no data; completion is detected by process exit.
pub const FINISH_PREFIX: &str = "FINISH";

/// The three benchmarked file operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Write,
    Read,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Write => "Write",
            Operation::Read => "Read",
            Operation::Delete => "Delete",
        };
        f.write_str(name)
    }
}

impl FromStr for Operation {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Write" => Ok(Operation::Write),
            "Read" => Ok(Operation::Read),
            "Delete" => Ok(Operation::Delete),
            other => Err(ProtocolError::UnknownOperation(other.to_string())),
        }
    }
}

/// Errors raised while parsing a `RESULT` line received from a child.
///
/// These are reportable but non-fatal: the parent logs the offending line
/// and continues draining the stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("expected 7 '|'-separated fields, found {0}")]
    FieldCount(usize),

    #[error("line does not start with {RESULT_PREFIX}")]
    MissingPrefix,

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("invalid size field: {0}")]
    InvalidSize(String),

    #[error("invalid duration field: {0}")]
    InvalidDuration(String),

    #[error("invalid success field: {0} (expected true or false)")]
    InvalidSuccess(String),
}

/// Outcome of one executed file operation.
///
/// Created once by the executor, never mutated, consumed exactly once by a
/// result consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct OpResult {
    /// File the operation acted on. Absolute within the executing process;
    /// reduced to the bare file name when crossing a process boundary.
    pub file: PathBuf,
    pub operation: Operation,
    /// Bytes transferred. For writes this is the requested size even on
    /// failure; for reads the bytes actually read.
    pub size: u64,
    /// Hex content digest, or [`crate::checksum::NO_CHECKSUM`] for deletes.
    pub checksum: String,
    /// Elapsed seconds, measured even when the operation failed.
    pub duration: f64,
    pub success: bool,
}

impl OpResult {
    /// The bare file name, the form of the subject used on the wire.
    pub fn name(&self) -> String {
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }

    /// Serialize to one protocol line (without trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "{} | {:<32} | {:<6} | {:>12} | {:<28} | {:.10} | {}",
            RESULT_PREFIX,
            self.name(),
            self.operation,
            self.size,
            self.checksum,
            self.duration,
            self.success
        )
    }

    /// Parse a protocol line produced by [`OpResult::to_line`].
    ///
    /// Whitespace around each `|`-separated field is ignored.
    pub fn parse_line(line: &str) -> Result<Self, ProtocolError> {
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();

        if fields.len() < 7 {
            return Err(ProtocolError::FieldCount(fields.len()));
        }

        if fields[0] != RESULT_PREFIX {
            return Err(ProtocolError::MissingPrefix);
        }

        let size: u64 = fields[3]
            .parse()
            .map_err(|_| ProtocolError::InvalidSize(fields[3].to_string()))?;
        let duration: f64 = fields[5]
            .parse()
            .map_err(|_| ProtocolError::InvalidDuration(fields[5].to_string()))?;
        let success = match fields[6] {
            "true" => true,
            "false" => false,
            other => return Err(ProtocolError::InvalidSuccess(other.to_string())),
        };

        Ok(Self {
            file: PathBuf::from(fields[1]),
            operation: fields[2].parse()?,
            size,
            checksum: fields[4].to_string(),
            duration,
            success,
        })
    }
}

/// True if the line is the terminal sentinel of a child's output.
pub fn is_finish_line(line: &str) -> bool {
    line.starts_with(FINISH_PREFIX)
}

/// True if the line is a serialized result.
pub fn is_result_line(line: &str) -> bool {
    line.starts_with(RESULT_PREFIX)
}

/// Convenience constructor used by the executor.
pub fn op_result(
    file: &Path,
    operation: Operation,
    size: u64,
    checksum: String,
    duration: f64,
    success: bool,
) -> OpResult {
    OpResult {
        file: file.to_path_buf(),
        operation,
        size,
        checksum,
        duration,
        success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OpResult {
        OpResult {
            file: PathBuf::from("/tmp/bench/rwperf#00000000deadbeef.dat"),
            operation: Operation::Write,
            size: 123_456,
            checksum: "a3f2".to_string(),
            duration: 0.123_456_789_9,
            success: true,
        }
    }

    #[test]
    fn test_line_round_trip() {
        let original = sample();
        let parsed = OpResult::parse_line(&original.to_line()).unwrap();

        assert_eq!(parsed.file, PathBuf::from("rwperf#00000000deadbeef.dat"));
        assert_eq!(parsed.operation, original.operation);
        assert_eq!(parsed.size, original.size);
        assert_eq!(parsed.checksum, original.checksum);
        assert_eq!(parsed.success, original.success);
        assert!((parsed.duration - original.duration).abs() < 1e-10);
    }

    #[test]
    fn test_line_layout() {
        let line = sample().to_line();
        assert!(line.starts_with("RESULT | rwperf#00000000deadbeef.dat"));
        assert!(line.contains("| Write "));
        assert!(line.contains("|       123456 |"));
        assert!(line.ends_with("| true"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let line = "RESULT |  a.dat  |  Read |  42 |  abc  | 0.5 |  false  ";
        let parsed = OpResult::parse_line(line).unwrap();
        assert_eq!(parsed.file, PathBuf::from("a.dat"));
        assert_eq!(parsed.operation, Operation::Read);
        assert_eq!(parsed.size, 42);
        assert_eq!(parsed.checksum, "abc");
        assert!(!parsed.success);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        let err = OpResult::parse_line("RESULT | only | three").unwrap_err();
        assert!(matches!(err, ProtocolError::FieldCount(3)));
    }

    #[test]
    fn test_parse_rejects_unknown_operation() {
        let line = "RESULT | a.dat | Fsync | 1 | x | 0.1 | true";
        let err = OpResult::parse_line(line).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOperation(_)));
    }

    #[test]
    fn test_parse_rejects_sloppy_success() {
        let line = "RESULT | a.dat | Read | 1 | x | 0.1 | yes";
        let err = OpResult::parse_line(line).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidSuccess(_)));
    }

    #[test]
    fn test_sentinel_classification() {
        assert!(is_finish_line("FINISHED"));
        assert!(is_finish_line("FINISH"));
        assert!(!is_finish_line(" FINISHED"));
        assert!(is_result_line("RESULT | …"));
        assert!(!is_result_line("warning: disk slow"));
    }

    #[test]
    fn test_operation_display_from_str_round_trip() {
        for op in [Operation::Write, Operation::Read, Operation::Delete] {
            assert_eq!(op.to_string().parse::<Operation>().unwrap(), op);
        }
    }
}
