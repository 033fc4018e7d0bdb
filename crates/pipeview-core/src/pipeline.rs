//! End-to-end trace rendering: decorate, build, enumerate, merge, emit.

use std::fmt;
use std::io::Write;

use tracing::{debug, info};

use crate::config::TraceConfig;
use crate::disasm::{disassemble_batch, request_token, Disassembler};
use crate::error::TraceError;
use crate::event::{EventRecord, ParsedLog};
use crate::graph::{DecoratedRecord, EventGraph};
use crate::paths::enumerate_paths;
use crate::schema::Schema;
use crate::timeline::{write_kanata, Timeline};

/// Counters describing one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceSummary {
    /// Records accepted from the log.
    pub records: usize,
    /// Log lines that failed to parse.
    pub skipped_lines: usize,
    /// Graph nodes (equal to `records`).
    pub nodes: usize,
    /// Distinct causal edges.
    pub edges: usize,
    /// Records whose parent could not be resolved.
    pub dangling_parents: usize,
    /// Lifecycles enumerated before filtering.
    pub paths: usize,
    /// Lifecycles ending in retirement.
    pub retired: usize,
    /// Lifecycles ending in a flush.
    pub squashed: usize,
    /// Lifecycles written to the output.
    pub rendered: usize,
    /// Kanata command lines written.
    pub commands: usize,
}

impl fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records ({} skipped), {} lifecycles ({} retired, {} squashed), {} rendered",
            self.records, self.skipped_lines, self.paths, self.retired, self.squashed, self.rendered
        )
    }
}

/// Replaces each record's data with its disassembled form.
///
/// All tokens go to `disassembler` in a single batch.
///
/// # Errors
///
/// Unknown stages, disassembler failures, and response count mismatches.
pub fn decorate(
    records: Vec<EventRecord>,
    schema: &Schema,
    config: &TraceConfig,
    disassembler: &mut dyn Disassembler,
) -> Result<Vec<DecoratedRecord>, TraceError> {
    let tokens = records
        .iter()
        .map(|record| request_token(record, schema, config))
        .collect::<Result<Vec<_>, _>>()?;
    let decoded = disassemble_batch(&tokens, disassembler)?;

    Ok(records
        .into_iter()
        .zip(decoded)
        .map(|(record, data)| DecoratedRecord {
            stage: record.event_name,
            id: record.id,
            parent: record.parent,
            cycle: record.cycle,
            data,
        })
        .collect())
}

/// Decorates the log and links it into an [`EventGraph`].
///
/// The returned summary has its ingestion and graph counters filled in.
///
/// # Errors
///
/// Any [`TraceError`] from decoration.
pub fn build_graph(
    log: ParsedLog,
    schema: &Schema,
    config: &TraceConfig,
    disassembler: &mut dyn Disassembler,
) -> Result<(EventGraph, TraceSummary), TraceError> {
    let records = log.records.len();
    let decorated = decorate(log.records, schema, config, disassembler)?;
    let graph = EventGraph::build(decorated);
    let summary = TraceSummary {
        records,
        skipped_lines: log.skipped_lines,
        nodes: graph.nodes().len(),
        edges: graph.edge_count(),
        dangling_parents: graph.dangling_parents(),
        ..TraceSummary::default()
    };
    Ok((graph, summary))
}

/// Enumerates, merges, and writes the Kanata trace for a built graph.
///
/// # Errors
///
/// [`TraceError::UnknownEventType`] or a write failure.
pub fn render_graph<W: Write>(
    graph: &EventGraph,
    schema: &Schema,
    config: &TraceConfig,
    mut summary: TraceSummary,
    out: &mut W,
) -> Result<TraceSummary, TraceError> {
    let paths = enumerate_paths(graph, schema);
    summary.paths = paths.len();
    summary.retired = paths.iter().filter(|p| p.is_retired()).count();
    summary.squashed = summary.paths - summary.retired;
    debug!(paths = summary.paths, retired = summary.retired, "enumerated lifecycles");

    let timeline = Timeline::merge(paths, config.verbose);
    summary.rendered = timeline.paths().len();
    let commands = timeline.emit(schema)?;
    summary.commands = commands.len();

    write_kanata(out, &commands)?;
    info!(%summary, "trace written");
    Ok(summary)
}

/// Runs the whole pipeline and writes the Kanata trace to `out`.
///
/// Nothing is written unless every stage succeeded.
///
/// # Errors
///
/// Any [`TraceError`] from decoration, emission, or writing.
pub fn render_trace<W: Write>(
    log: ParsedLog,
    schema: &Schema,
    config: &TraceConfig,
    disassembler: &mut dyn Disassembler,
    out: &mut W,
) -> Result<TraceSummary, TraceError> {
    let (graph, summary) = build_graph(log, schema, config, disassembler)?;
    render_graph(&graph, schema, config, summary, out)
}
