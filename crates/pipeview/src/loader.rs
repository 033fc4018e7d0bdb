//! Reading the event log and schema document from disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pipeview_core::{parse_log, ParsedLog, Schema, SchemaDocument, SchemaError};
use thiserror::Error;

/// Failure to load one of the run's input files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The schema is not valid JSON or is missing a required array.
    #[error("malformed schema {}: {source}", path.display())]
    SchemaSyntax {
        /// Schema file.
        path: PathBuf,
        /// JSON decoding failure.
        source: serde_json::Error,
    },
    /// The schema parsed but is inconsistent.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses an event log. Malformed lines are counted, not fatal.
///
/// # Errors
///
/// [`LoadError::Read`] when the file cannot be read.
pub fn load_log(path: &Path) -> Result<ParsedLog, LoadError> {
    Ok(parse_log(&read(path)?))
}

/// Reads and validates a JSON schema document.
///
/// # Errors
///
/// [`LoadError`] for unreadable, malformed, or inconsistent schemas.
pub fn load_schema(path: &Path) -> Result<Schema, LoadError> {
    let document: SchemaDocument =
        serde_json::from_str(&read(path)?).map_err(|source| LoadError::SchemaSyntax {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Schema::try_from(document)?)
}
