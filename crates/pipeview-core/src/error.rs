use thiserror::Error;

/// Fatal conditions that abort a trace run before any partial output is trusted.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A stage has no datatype entry in the schema, so its labels cannot be rendered.
    #[error("event `{stage}` has no datatype in the schema")]
    UnknownEventType {
        /// The offending event name.
        stage: String,
    },
    /// The external disassembler could not be run or reported failure.
    #[error("disassembler failed: {0}")]
    Disassembler(String),
    /// The disassembler answered with a different number of tokens than it was sent.
    #[error("disassembler returned {actual} tokens for a request of {expected}")]
    DisassemblyCountMismatch {
        /// Tokens sent in the batch request.
        expected: usize,
        /// Tokens found in the response.
        actual: usize,
    },
    /// Writing the trace output failed.
    #[error("failed to write trace output")]
    Io(#[from] std::io::Error),
}

/// Structural problems in a pipeline schema document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// `event_names` and `event_types` must be aligned positionally.
    #[error("schema lists {names} event names but {types} event types")]
    LengthMismatch {
        /// Length of `event_names`.
        names: usize,
        /// Length of `event_types`.
        types: usize,
    },
    /// The same event name appears twice in `event_names`.
    #[error("event `{0}` is declared more than once")]
    DuplicateEvent(String),
}

/// Reasons a single log line is rejected during ingestion.
///
/// Rejected lines are skipped by [`crate::event::parse_log`]; the reason only
/// feeds diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogParseError {
    /// Fewer than the five whitespace-separated fields.
    #[error("expected 5 fields, found {0}")]
    MissingFields(usize),
    /// The event id is not valid hexadecimal.
    #[error("invalid event id `{0}`")]
    InvalidId(String),
    /// The parent id is not valid hexadecimal.
    #[error("invalid parent id `{0}`")]
    InvalidParent(String),
    /// The cycle is not a decimal integer.
    #[error("invalid cycle `{0}`")]
    InvalidCycle(String),
}
