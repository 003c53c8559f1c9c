//! Line-delimited JSON input and output handles.
//!
//! Sources and sinks follow the `postqueue` CLI convention: a path of
//! `"-"` means the standard stream. Decoding is strictly one record per
//! line; a line that fails to decode is the caller's problem to log and
//! skip, never a reason to abort.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use mailqf_core::error::{MailqfError, Result};
use mailqf_core::models::QueueRecord;
use serde_json::Value;

/// Path spelling for standard input/output.
pub const DASH: &str = "-";

/// Open an input source, `"-"` for stdin.
pub fn open_input(path: &str) -> Result<Box<dyn BufRead>> {
    if path == DASH {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|source| MailqfError::FileOpen {
        path: PathBuf::from(path),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Open an output sink, `"-"` for stdout.
pub fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if path == DASH {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path).map_err(|source| MailqfError::FileOpen {
        path: PathBuf::from(path),
        source,
    })?;
    Ok(Box::new(file))
}

/// Decode one input line into a record. Blank lines yield `Ok(None)`.
pub fn decode_record(line: &str) -> Result<Option<QueueRecord>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed)?;
    Ok(Some(QueueRecord::new(value)))
}
