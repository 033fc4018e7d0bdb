//! Batch interface to the external instruction disassembler.
//!
//! The disassembler sees one pipe-delimited request per run and answers with
//! one pipe-delimited response. Tokens are correlated purely by position.

use tracing::debug;

use crate::config::TraceConfig;
use crate::decoder::Decoder;
use crate::error::TraceError;
use crate::event::EventRecord;
use crate::schema::{EventType, Schema};

/// Separator between tokens in requests and responses.
pub const TOKEN_SEPARATOR: &str = "|";

/// A blocking batch disassembler.
pub trait Disassembler {
    /// Translates a pipe-delimited request into a pipe-delimited response
    /// with the same number of tokens, in the same order.
    ///
    /// # Errors
    ///
    /// [`TraceError::Disassembler`] when the backend cannot be run.
    fn disassemble(&mut self, request: &str) -> Result<String, TraceError>;
}

/// Builds the request token for one record.
///
/// Instruction bytes become `DASM(<data>)`, or the RoCC decoding when
/// `config.rocc_decode` is set; any other data passes through.
///
/// # Errors
///
/// [`TraceError::UnknownEventType`] when the record's stage is not in the
/// schema.
pub fn request_token(
    record: &EventRecord,
    schema: &Schema,
    config: &TraceConfig,
) -> Result<String, TraceError> {
    Ok(match schema.datatype(&record.event_name)? {
        EventType::InstBytes if config.rocc_decode => Decoder::decode_hex(&record.data),
        EventType::InstBytes => format!("DASM({})", record.data),
        EventType::Pc | EventType::Other(_) => record.data.clone(),
    })
}

/// Sends all tokens in one request and splits the response.
///
/// The backend is invoked exactly once, even for an empty batch.
///
/// # Errors
///
/// Backend failures, and [`TraceError::DisassemblyCountMismatch`] when the
/// response token count differs from the request.
pub fn disassemble_batch(
    tokens: &[String],
    disassembler: &mut dyn Disassembler,
) -> Result<Vec<String>, TraceError> {
    let request = tokens.join(TOKEN_SEPARATOR);
    debug!(tokens = tokens.len(), bytes = request.len(), "sending disassembly batch");
    let response = disassembler.disassemble(&request)?;

    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let decoded: Vec<String> = response
        .trim_end_matches(['\n', '\r'])
        .split(TOKEN_SEPARATOR)
        .map(str::to_string)
        .collect();

    if decoded.len() != tokens.len() {
        return Err(TraceError::DisassemblyCountMismatch {
            expected: tokens.len(),
            actual: decoded.len(),
        });
    }

    Ok(decoded)
}
