//! Timed, checksummed execution of single file operations
//!
//! Each operation is timed from just before the filesystem call to just
//! after it completes, yields exactly one [`OpResult`] regardless of
//! outcome, and never lets an I/O error escape: failures are captured as
//! `success = false` plus a diagnostic on stderr, leaving sibling tasks
//! unaffected.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::checksum::{Checksum, NO_CHECKSUM};
use crate::result::{op_result, OpResult, Operation};
use crate::stopwatch::Stopwatch;

/// Fixed chunk size for generated content and read streaming.
pub const BUFFER_SIZE: usize = 4096;

/// Write `size` bytes of pseudo-random content to `file`.
///
/// Content is regenerated by re-seeding a generator with `seed` and drawing
/// fixed-size chunks, writing and digesting each chunk in lockstep, so the
/// same seed always reproduces the same byte stream. The reported size is
/// the requested size even when the write fails partway; the digest covers
/// whatever was chunked before the failure.
pub fn write(file: &Path, seed: u64, size: u64) -> OpResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut checksum = Checksum::new();
    let mut remaining = size;

    let watch = Stopwatch::start();

    let outcome = (|| -> std::io::Result<()> {
        let mut out = File::create(file)?;

        while remaining > 0 {
            rng.fill_bytes(&mut buffer);

            let length = remaining.min(BUFFER_SIZE as u64) as usize;

            out.write_all(&buffer[..length])?;
            checksum.update(&buffer[..length]);

            remaining -= length as u64;
        }

        Ok(())
    })();

    let duration = watch.elapsed();
    let success = report_failure(&outcome, Operation::Write, file);

    op_result(file, Operation::Write, size, checksum.finish(), duration, success)
}

/// Read `file` to end of file, digesting the content.
///
/// The reported size is the number of bytes actually read, which falls
/// short of the written size only on failure paths.
pub fn read(file: &Path) -> OpResult {
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut checksum = Checksum::new();
    let mut size = 0u64;

    let watch = Stopwatch::start();

    let outcome = (|| -> std::io::Result<()> {
        let mut input = File::open(file)?;

        loop {
            let length = input.read(&mut buffer)?;

            if length == 0 {
                break;
            }

            size += length as u64;
            checksum.update(&buffer[..length]);
        }

        Ok(())
    })();

    let duration = watch.elapsed();
    let success = report_failure(&outcome, Operation::Read, file);

    op_result(file, Operation::Read, size, checksum.finish(), duration, success)
}

/// Remove `file`, recording its size as seen just before removal.
///
/// Deletion has no content to digest; the result carries the fixed
/// checksum placeholder.
pub fn delete(file: &Path) -> OpResult {
    let watch = Stopwatch::start();

    let size = fs::metadata(file).map(|meta| meta.len()).unwrap_or(0);
    let outcome = fs::remove_file(file);

    let duration = watch.elapsed();
    let success = report_failure(&outcome, Operation::Delete, file);

    op_result(
        file,
        Operation::Delete,
        size,
        NO_CHECKSUM.to_string(),
        duration,
        success,
    )
}

fn report_failure<T>(outcome: &std::io::Result<T>, operation: Operation, file: &Path) -> bool {
    match outcome {
        Ok(_) => true,
        Err(error) => {
            eprintln!("{} of {} failed: {}", operation, file.display(), error);
            false
        }
    }
}
