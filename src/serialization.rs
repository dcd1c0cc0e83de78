//! Batch input and output of JSON documents.
//!
//! Batches are NDJSON (one document per line) on the way in, and NDJSON or
//! a single JSON array on the way out.

use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::Value;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Read an NDJSON batch.
///
/// Yields `(line_number, document)` pairs with 1-based line numbers.
/// Blank lines are skipped; a line that fails to parse yields an error for
/// that line only, so callers can report it and carry on.
pub fn read_ndjson<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = (usize, Result<Value, SerializationError>)> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let parsed = match line {
                Ok(line) if line.trim().is_empty() => return None,
                Ok(line) => serde_json::from_str(&line).map_err(SerializationError::from),
                Err(e) => Err(SerializationError::from(e)),
            };
            Some((i + 1, parsed))
        })
}

/// NDJSON (Newline Delimited JSON) writer
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single document as an NDJSON line
    pub fn write<T: Serialize>(&mut self, doc: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(doc)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer
///
/// Writes documents as one JSON array, streaming element by element.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first: true,
        })
    }

    pub fn write<T: Serialize>(&mut self, doc: &T) -> Result<(), SerializationError> {
        if !self.first {
            write!(self.writer, ",")?;
        }
        self.first = false;

        let json = serde_json::to_string(doc)?;
        write!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Finish writing the array and close the bracket
    pub fn finish(mut self) -> Result<(), SerializationError> {
        writeln!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}
