//! Speculative lifecycle enumeration.
//!
//! Every root-to-leaf route through the event graph is one candidate
//! lifecycle. Routes that share a prefix (a fetch that fans out into a
//! replayed or misspeculated sequence) produce one path each.

use std::fmt;

use crate::graph::EventGraph;
use crate::schema::Schema;

/// Stage name of the synthetic retire marker.
pub const RETIRE_STAGE: &str = "KONNATA_RET";
/// Stage name of the synthetic squash marker.
pub const FLUSH_STAGE: &str = "FLUSH";

/// How a lifecycle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// The leaf stage is an end stage.
    Retire,
    /// The leaf stage is not an end stage; the instruction was squashed.
    Flush,
}

impl Terminal {
    /// Stage name used for the marker.
    #[must_use]
    pub const fn stage(self) -> &'static str {
        match self {
            Self::Retire => RETIRE_STAGE,
            Self::Flush => FLUSH_STAGE,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage())
    }
}

/// One step of a lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// A recorded event.
    Event {
        /// Stage name.
        stage: String,
        /// Observation cycle.
        cycle: u64,
        /// Decoded data.
        data: String,
    },
    /// The synthetic end of the lifecycle.
    Terminal {
        /// Retire or flush.
        kind: Terminal,
        /// One past the leaf's cycle, saturating at `u64::MAX`.
        cycle: u64,
    },
}

impl PathStep {
    /// Stage name, including the synthetic terminal names.
    #[must_use]
    pub fn stage(&self) -> &str {
        match self {
            Self::Event { stage, .. } => stage,
            Self::Terminal { kind, .. } => kind.stage(),
        }
    }

    /// Cycle of the step.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        match self {
            Self::Event { cycle, .. } | Self::Terminal { cycle, .. } => *cycle,
        }
    }

    /// Data of the step; terminals carry none.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Event { data, .. } => Some(data),
            Self::Terminal { .. } => None,
        }
    }
}

/// A complete lifecycle: recorded events followed by exactly one terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    root: usize,
    steps: Vec<PathStep>,
}

impl Path {
    /// Sequence id of the root this path was enumerated from, in root order.
    #[must_use]
    pub const fn root(&self) -> usize {
        self.root
    }

    /// All steps; the last one is always the terminal.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// How the lifecycle ended.
    #[must_use]
    pub fn terminal(&self) -> Terminal {
        match self.steps.last() {
            Some(PathStep::Terminal { kind, .. }) => *kind,
            _ => unreachable!("paths are always finalized with a terminal step"),
        }
    }

    /// True when the lifecycle retired.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.terminal() == Terminal::Retire
    }
}

/// Expands the graph into every root-to-leaf lifecycle.
///
/// Roots are visited in node insertion order and children in edge insertion
/// order, so the output matches a recursive pre-order walk. The walk uses an
/// explicit stack; long chains do not grow the call stack.
#[must_use]
pub fn enumerate_paths(graph: &EventGraph, schema: &Schema) -> Vec<Path> {
    let nodes = graph.nodes();
    let mut paths = Vec::new();

    for (root_seq, root) in graph.roots().enumerate() {
        // (node, prefix length before this node)
        let mut stack = vec![(root, 0usize)];
        let mut prefix: Vec<PathStep> = Vec::new();

        while let Some((idx, depth)) = stack.pop() {
            prefix.truncate(depth);
            let node = &nodes[idx];
            prefix.push(PathStep::Event {
                stage: node.stage.clone(),
                cycle: node.cycle,
                data: node.data.clone(),
            });

            let children = graph.children(idx);
            if children.is_empty() {
                let kind = if schema.is_end_stage(&node.stage) {
                    Terminal::Retire
                } else {
                    Terminal::Flush
                };
                let mut steps = prefix.clone();
                steps.push(PathStep::Terminal {
                    kind,
                    cycle: node.cycle.saturating_add(1),
                });
                paths.push(Path {
                    root: root_seq,
                    steps,
                });
                continue;
            }

            stack.extend(children.iter().rev().map(|child| (*child, depth + 1)));
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{enumerate_paths, PathStep, Terminal, FLUSH_STAGE, RETIRE_STAGE};
    use crate::graph::{record, EventGraph};
    use crate::schema::test_schema;

    fn stages(steps: &[PathStep]) -> Vec<(&str, u64)> {
        steps.iter().map(|s| (s.stage(), s.cycle())).collect()
    }

    #[test]
    fn reused_id_forms_single_retired_path() {
        let schema = test_schema();
        let graph = EventGraph::build([
            record("fetch", 1, None, 0),
            record("commit", 1, Some(1), 2),
        ]);
        let paths = enumerate_paths(&graph, &schema);

        assert_eq!(paths.len(), 1);
        assert_eq!(
            stages(paths[0].steps()),
            vec![("fetch", 0), ("commit", 2), (RETIRE_STAGE, 3)]
        );
        assert_eq!(paths[0].steps()[2].data(), None);
        assert!(paths[0].is_retired());
    }

    #[test]
    fn fork_yields_prefix_sharing_paths() {
        let schema = test_schema();
        let graph = EventGraph::build([
            record("fetch", 1, None, 0),
            record("decode", 2, Some(1), 1),
            record("issue", 3, Some(1), 1),
            record("commit", 2, Some(2), 4),
        ]);
        let paths = enumerate_paths(&graph, &schema);

        assert_eq!(paths.len(), 2);
        assert_eq!(
            stages(paths[0].steps()),
            vec![("fetch", 0), ("decode", 1), ("commit", 4), (RETIRE_STAGE, 5)]
        );
        assert_eq!(
            stages(paths[1].steps()),
            vec![("fetch", 0), ("issue", 1), (FLUSH_STAGE, 2)]
        );
        assert_eq!(paths[0].root(), paths[1].root());
        assert_eq!(paths[1].terminal(), Terminal::Flush);
    }

    #[test]
    fn lone_root_is_its_own_leaf() {
        let schema = test_schema();
        let graph = EventGraph::build([record("fetch", 1, None, 10), record("commit", 2, None, 11)]);
        let paths = enumerate_paths(&graph, &schema);

        assert_eq!(paths.len(), 2);
        assert_eq!(stages(paths[0].steps()), vec![("fetch", 10), (FLUSH_STAGE, 11)]);
        assert_eq!(stages(paths[1].steps()), vec![("commit", 11), (RETIRE_STAGE, 12)]);
        assert_eq!(paths[1].root(), 1);
    }

    #[test]
    fn terminal_after_last_representable_cycle_saturates() {
        let schema = test_schema();
        let graph = EventGraph::build([
            record("fetch", 1, None, u64::MAX - 1),
            record("commit", 1, Some(1), u64::MAX),
        ]);
        let paths = enumerate_paths(&graph, &schema);

        assert_eq!(
            stages(paths[0].steps()),
            vec![
                ("fetch", u64::MAX - 1),
                ("commit", u64::MAX),
                (RETIRE_STAGE, u64::MAX)
            ]
        );
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let schema = test_schema();
        let chain = (0..50_000u64).map(|cycle| {
            let stage = if cycle == 49_999 { "commit" } else { "issue" };
            record(stage, 1, (cycle > 0).then_some(1), cycle)
        });
        let paths = enumerate_paths(&EventGraph::build(chain), &schema);

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].steps().len(), 50_001);
        assert!(paths[0].is_retired());
    }

    proptest! {
        #[test]
        fn every_path_ends_in_exactly_one_matching_terminal(
            links in prop::collection::vec((0u64..6, prop::option::of(0u64..6), 0usize..4), 1..40)
        ) {
            let schema = test_schema();
            let names = ["fetch", "decode", "issue", "commit"];
            let graph = EventGraph::build(links.iter().enumerate().map(|(cycle, (id, parent, stage))| {
                record(names[*stage], *id, *parent, cycle as u64)
            }));
            let paths = enumerate_paths(&graph, &schema);

            let leaves = (0..graph.nodes().len())
                .filter(|idx| graph.children(*idx).is_empty())
                .count();
            prop_assert!(paths.len() >= leaves);

            for path in &paths {
                let steps = path.steps();
                let terminals = steps
                    .iter()
                    .filter(|s| matches!(s, PathStep::Terminal { .. }))
                    .count();
                prop_assert_eq!(terminals, 1);

                let leaf = &steps[steps.len() - 2];
                let last = &steps[steps.len() - 1];
                prop_assert_eq!(last.cycle(), leaf.cycle() + 1);
                prop_assert_eq!(path.is_retired(), schema.is_end_stage(leaf.stage()));
            }
        }
    }
}
