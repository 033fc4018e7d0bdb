//! Simulator event log ingestion.
//!
//! Each log line carries one pipeline event in five whitespace-separated
//! fields:
//!
//! ```text
//! <event_name> <id:hex> <parent:hex, 0 = none> <cycle:decimal> <data>
//! ```
//!
//! Lines that do not parse are skipped; ingestion never fails as a whole.

use std::fmt;

use tracing::debug;

use crate::error::LogParseError;

/// One timestamped lifecycle annotation for a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventRecord {
    /// Stage name, resolved against the schema.
    pub event_name: String,
    /// Raw producer id. Producers may reuse ids.
    pub id: u64,
    /// Declared causal parent, if any.
    pub parent: Option<u64>,
    /// Simulation cycle the event was observed at.
    pub cycle: u64,
    /// Raw payload text.
    pub data: String,
}

impl EventRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(
        event_name: impl Into<String>,
        id: u64,
        parent: Option<u64>,
        cycle: u64,
        data: impl Into<String>,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            id,
            parent,
            cycle,
            data: data.into(),
        }
    }
}

/// Renders the record in log line format, so it parses back to itself.
impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:x} {:x} {} {}",
            self.event_name,
            self.id,
            self.parent.unwrap_or(0),
            self.cycle,
            self.data
        )
    }
}

/// Records accepted from a log plus the number of lines that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLog {
    /// Accepted records in arrival order.
    pub records: Vec<EventRecord>,
    /// Non-blank lines rejected by [`parse_log_line`].
    pub skipped_lines: usize,
}

fn parse_hex(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).ok()
}

/// Parses one log line.
///
/// Fields beyond the fifth are ignored. A parent of `0` means "no parent".
///
/// # Errors
///
/// Returns the first field that failed to parse.
pub fn parse_log_line(line: &str) -> Result<EventRecord, LogParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [event_name, id, parent, cycle, data, ..] = fields.as_slice() else {
        return Err(LogParseError::MissingFields(fields.len()));
    };

    let id = parse_hex(id).ok_or_else(|| LogParseError::InvalidId((*id).to_string()))?;
    let parent = match parse_hex(parent) {
        Some(0) => None,
        Some(value) => Some(value),
        None => return Err(LogParseError::InvalidParent((*parent).to_string())),
    };
    let cycle = cycle
        .parse::<u64>()
        .map_err(|_| LogParseError::InvalidCycle((*cycle).to_string()))?;

    Ok(EventRecord {
        event_name: (*event_name).to_string(),
        id,
        parent,
        cycle,
        data: (*data).to_string(),
    })
}

/// Parses a whole log, keeping arrival order and skipping malformed lines.
#[must_use]
pub fn parse_log(content: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_log_line(line) {
            Ok(record) => parsed.records.push(record),
            Err(reason) => {
                debug!(line = idx + 1, %reason, "skipping malformed log line");
                parsed.skipped_lines += 1;
            }
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{parse_log, parse_log_line, EventRecord};
    use crate::error::LogParseError;

    #[test]
    fn parses_simulator_line_with_trailing_space() {
        let record = parse_log_line("rob_issue 1f 0 120 0x00b3 \n").expect("valid line");
        assert_eq!(
            record,
            EventRecord::new("rob_issue", 0x1f, None, 120, "0x00b3")
        );
    }

    #[test]
    fn nonzero_parent_is_kept() {
        let record = parse_log_line("commit a 1f 7 deadbeef").expect("valid line");
        assert_eq!(record.parent, Some(0x1f));
        assert_eq!(record.id, 0xa);
    }

    #[rstest]
    #[case("fetch 1 0 5", LogParseError::MissingFields(4))]
    #[case("fetch zz 0 5 d", LogParseError::InvalidId("zz".to_string()))]
    #[case("fetch 1 q 5 d", LogParseError::InvalidParent("q".to_string()))]
    #[case("fetch 1 0 0x5 d", LogParseError::InvalidCycle("0x5".to_string()))]
    fn rejects_malformed_lines(#[case] line: &str, #[case] expected: LogParseError) {
        assert_eq!(parse_log_line(line), Err(expected));
    }

    #[test]
    fn parse_log_skips_bad_lines_and_keeps_order() {
        let content = "fetch 1 0 0 a\ngarbage\n\nretire 1 1 4 b\n";
        let parsed = parse_log(content);

        assert_eq!(parsed.skipped_lines, 1);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].event_name, "fetch");
        assert_eq!(parsed.records[1].parent, Some(1));
    }

    #[test]
    fn display_round_trips_through_parser() {
        let record = EventRecord::new("decode", 0xabc, Some(0x12), 99, "0x4000");
        let line = record.to_string();
        assert_eq!(line, "decode abc 12 99 0x4000");
        assert_eq!(parse_log_line(&line), Ok(record));
    }
}
