//! Cycle-ordered merge of lifecycles and Kanata log emission.
//!
//! Kanata is a line-oriented, tab-separated command log consumed by the
//! Konata pipeline viewer. Each retained lifecycle becomes one instruction
//! whose id is its position among the retained paths.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::io::{self, Write};

use crate::error::TraceError;
use crate::paths::{Path, PathStep, Terminal};
use crate::schema::{EventType, Schema};

/// Format version written in the header line.
pub const KANATA_VERSION: &str = "0004";

/// One line of Kanata output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KanataCommand {
    /// `Kanata 0004` header.
    Header,
    /// `C=`: absolute starting cycle.
    SetCycle(u64),
    /// `C`: advance by a cycle delta.
    AdvanceCycle(u64),
    /// `I`: an instruction enters the pipeline.
    Start {
        /// Instruction id in this file.
        id: usize,
        /// Cycle of entry.
        cycle: u64,
    },
    /// `S`: the instruction enters a stage.
    Stage {
        /// Instruction id.
        id: usize,
        /// Stage name.
        stage: String,
    },
    /// `L`: label text for the instruction.
    Label {
        /// Instruction id.
        id: usize,
        /// 0 for the pane label, 1 and 2 for tooltip lines.
        lane: u8,
        /// Label text, written verbatim.
        text: String,
    },
    /// `R`: the instruction leaves the pipeline.
    Retire {
        /// Instruction id.
        id: usize,
        /// True when the instruction was flushed instead of committed.
        squashed: bool,
    },
}

impl fmt::Display for KanataCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "Kanata\t{KANATA_VERSION}"),
            Self::SetCycle(cycle) => write!(f, "C=\t{cycle}"),
            Self::AdvanceCycle(delta) => write!(f, "C\t{delta}"),
            Self::Start { id, cycle } => write!(f, "I\t{id}\t{cycle}\t0"),
            Self::Stage { id, stage } => write!(f, "S\t{id}\t0\t{stage}"),
            Self::Label { id, lane, text } => write!(f, "L\t{id}\t{lane}\t{text}"),
            Self::Retire { id, squashed } => write!(f, "R\t{id}\t{id}\t{}", u8::from(*squashed)),
        }
    }
}

/// Retained lifecycles plus their global cycle order.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    paths: Vec<Path>,
    order: Vec<(u64, usize, usize)>,
}

impl Timeline {
    /// Merges lifecycles into one cycle-ordered sequence.
    ///
    /// Without `verbose`, flushed lifecycles are dropped first. Steps with
    /// equal cycles are ordered by instruction id, then by position in their
    /// path.
    #[must_use]
    pub fn merge(paths: Vec<Path>, verbose: bool) -> Self {
        let paths: Vec<Path> = if verbose {
            paths
        } else {
            paths.into_iter().filter(Path::is_retired).collect()
        };

        let mut heap = BinaryHeap::new();
        for (id, path) in paths.iter().enumerate() {
            for (step_idx, step) in path.steps().iter().enumerate() {
                heap.push(Reverse((step.cycle(), id, step_idx)));
            }
        }

        let mut order = Vec::with_capacity(heap.len());
        while let Some(Reverse(entry)) = heap.pop() {
            order.push(entry);
        }

        Self { paths, order }
    }

    /// Retained lifecycles, indexed by instruction id.
    #[must_use]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Number of merged steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no lifecycle was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Steps in emission order as `(instruction id, step)`.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &PathStep)> + '_ {
        self.order
            .iter()
            .map(|&(_, id, step_idx)| (id, &self.paths[id].steps()[step_idx]))
    }

    /// Produces the Kanata command stream.
    ///
    /// # Errors
    ///
    /// [`TraceError::UnknownEventType`] when a recorded stage is missing from
    /// the schema.
    pub fn emit(&self, schema: &Schema) -> Result<Vec<KanataCommand>, TraceError> {
        let mut commands = vec![KanataCommand::Header];
        let Some(&(first_cycle, _, _)) = self.order.first() else {
            return Ok(commands);
        };

        commands.push(KanataCommand::SetCycle(first_cycle));
        let mut prev_cycle = first_cycle;

        for (id, step) in self.entries() {
            let cycle = step.cycle();
            if cycle > prev_cycle {
                commands.push(KanataCommand::AdvanceCycle(cycle - prev_cycle));
                prev_cycle = cycle;
            }

            if schema.is_start_stage(step.stage()) {
                commands.push(KanataCommand::Start { id, cycle });
            }

            match step {
                PathStep::Terminal { kind, .. } => commands.push(KanataCommand::Retire {
                    id,
                    squashed: *kind == Terminal::Flush,
                }),
                PathStep::Event { stage, data, .. } => {
                    commands.push(KanataCommand::Stage {
                        id,
                        stage: stage.clone(),
                    });
                    push_labels(&mut commands, id, schema.datatype(stage)?, data);
                }
            }
        }

        Ok(commands)
    }
}

fn push_labels(commands: &mut Vec<KanataCommand>, id: usize, datatype: &EventType, data: &str) {
    match datatype {
        EventType::InstBytes => commands.push(KanataCommand::Label {
            id,
            lane: 0,
            text: format!("{data}\\n"),
        }),
        EventType::Pc => commands.push(KanataCommand::Label {
            id,
            lane: 0,
            text: format!("PC:{data} "),
        }),
        EventType::Other(_) => {
            for lane in [1, 2] {
                commands.push(KanataCommand::Label {
                    id,
                    lane,
                    text: format!("\\n{data} "),
                });
            }
        }
    }
}

/// Writes commands one per line.
///
/// # Errors
///
/// Propagates write failures from `out`.
pub fn write_kanata<W: Write>(out: &mut W, commands: &[KanataCommand]) -> io::Result<()> {
    for command in commands {
        writeln!(out, "{command}")?;
    }
    out.flush()
}
