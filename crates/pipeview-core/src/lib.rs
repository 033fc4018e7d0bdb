//! Core pipeline-trace reconstruction for pipeview.
//!
//! Turns a simulator event log into a Kanata pipeline trace: events are
//! decoded, linked into a causal graph, expanded into speculative
//! lifecycles, and merged into one cycle-ordered command stream.

/// Run-wide configuration switches.
pub mod config;
pub use config::TraceConfig;

/// Error taxonomy for ingestion, schema validation, and rendering.
pub mod error;
pub use error::{LogParseError, SchemaError, TraceError};

/// Event log records and line parsing.
pub mod event;
pub use event::{parse_log, parse_log_line, EventRecord, ParsedLog};

/// Pipeline schema: stage datatypes and lifecycle boundaries.
pub mod schema;
pub use schema::{EventType, Schema, SchemaDocument};

/// RoCC command words and the function-code table.
pub mod rocc;
pub use rocc::{classify_funct, Funct, RoccCommand, FUNCT_TABLE};

/// Bitfield decoding of RoCC operands.
pub mod decoder;
pub use decoder::{render_fields, DecodedCommand, Decoder, FieldLayout};

/// Batch disassembler seam.
pub mod disasm;
pub use disasm::{disassemble_batch, request_token, Disassembler, TOKEN_SEPARATOR};

/// Causal event graph with id uniquification.
pub mod graph;
pub use graph::{DecoratedRecord, EventGraph, Node, NodeKey};

/// Speculative lifecycle enumeration.
pub mod paths;
pub use paths::{enumerate_paths, Path, PathStep, Terminal, FLUSH_STAGE, RETIRE_STAGE};

/// Cycle-ordered merge and Kanata emission.
pub mod timeline;
pub use timeline::{write_kanata, KanataCommand, Timeline, KANATA_VERSION};

/// End-to-end rendering.
pub mod pipeline;
pub use pipeline::{build_graph, decorate, render_graph, render_trace, TraceSummary};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
