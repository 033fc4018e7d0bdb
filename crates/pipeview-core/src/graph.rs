//! Causal event graph reconstructed from a flat event stream.
//!
//! Producers reuse raw ids, so every occurrence of an id becomes its own node
//! keyed by `(raw_id, revision)`, where the revision counts earlier
//! occurrences of that id. A child links to the latest revision of its parent
//! seen so far. When an event names itself as parent, the link goes to the
//! previous revision instead, which keeps the graph acyclic.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use tracing::{debug, warn};

/// Unique node identity: raw producer id plus occurrence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    /// Raw id as written in the log.
    pub raw_id: u64,
    /// Zero-based occurrence of `raw_id` as an event's own id.
    pub revision: u32,
}

impl NodeKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(raw_id: u64, revision: u32) -> Self {
        Self { raw_id, revision }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}rev{}", self.raw_id, self.revision)
    }
}

/// A single pipeline event placed in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique key.
    pub key: NodeKey,
    /// Stage (event name).
    pub stage: String,
    /// Cycle the event was observed at.
    pub cycle: u64,
    /// Decoded event data.
    pub data: String,
}

/// One event as handed to the graph builder: raw ids plus decoded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedRecord {
    /// Stage (event name).
    pub stage: String,
    /// Raw producer id.
    pub id: u64,
    /// Declared raw parent id.
    pub parent: Option<u64>,
    /// Observation cycle.
    pub cycle: u64,
    /// Data after disassembly/decoding.
    pub data: String,
}

/// Index-addressed DAG of events.
#[derive(Debug, Clone, Default)]
pub struct EventGraph {
    nodes: Vec<Node>,
    index: HashMap<NodeKey, usize>,
    children: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
    revisions: HashMap<u64, u32>,
    edge_count: usize,
    dangling_parents: usize,
}

impl EventGraph {
    /// Builds the graph from records in log arrival order.
    ///
    /// Every record becomes a node. A record whose parent id has never been
    /// seen keeps no incoming edge and is logged as a dangling reference.
    #[must_use]
    pub fn build(records: impl IntoIterator<Item = DecoratedRecord>) -> Self {
        let mut graph = Self::default();
        for record in records {
            graph.insert(record);
        }
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edge_count,
            dangling = graph.dangling_parents,
            "built event graph"
        );
        graph
    }

    fn insert(&mut self, record: DecoratedRecord) {
        let revision = *self
            .revisions
            .entry(record.id)
            .and_modify(|count| *count += 1)
            .or_insert(0);
        let key = NodeKey::new(record.id, revision);

        let node_idx = self.nodes.len();
        self.nodes.push(Node {
            key,
            stage: record.stage,
            cycle: record.cycle,
            data: record.data,
        });
        self.index.insert(key, node_idx);
        self.children.push(Vec::new());
        self.in_degree.push(0);

        let Some(parent_id) = record.parent else {
            return;
        };

        let Some(parent_key) = self.resolve_parent(parent_id, key) else {
            warn!(
                node = %key,
                parent_id,
                "parent id never seen; event starts its own lifecycle"
            );
            self.dangling_parents += 1;
            return;
        };

        let Some(&parent_idx) = self.index.get(&parent_key) else {
            warn!(node = %key, parent = %parent_key, "parent revision missing");
            self.dangling_parents += 1;
            return;
        };

        if !self.children[parent_idx].contains(&node_idx) {
            self.children[parent_idx].push(node_idx);
            self.in_degree[node_idx] += 1;
            self.edge_count += 1;
        }
    }

    /// Latest revision of `parent_id`, stepping back one revision when that
    /// would be `child` itself.
    fn resolve_parent(&self, parent_id: u64, child: NodeKey) -> Option<NodeKey> {
        let latest = *self.revisions.get(&parent_id)?;
        let candidate = NodeKey::new(parent_id, latest);
        if candidate == child {
            latest.checked_sub(1).map(|rev| NodeKey::new(parent_id, rev))
        } else {
            Some(candidate)
        }
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Looks up the arena index of a key.
    #[must_use]
    pub fn index_of(&self, key: NodeKey) -> Option<usize> {
        self.index.get(&key).copied()
    }

    /// Child indices of node `idx`, in edge insertion order.
    #[must_use]
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Number of incoming edges of node `idx`.
    #[must_use]
    pub fn in_degree(&self, idx: usize) -> usize {
        self.in_degree[idx]
    }

    /// Indices of nodes without incoming edges, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.in_degree
            .iter()
            .enumerate()
            .filter_map(|(idx, degree)| (*degree == 0).then_some(idx))
    }

    /// Highest revision assigned to each raw id.
    #[must_use]
    pub const fn revisions(&self) -> &HashMap<u64, u32> {
        &self.revisions
    }

    /// Total number of distinct edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Records whose parent could not be resolved.
    #[must_use]
    pub const fn dangling_parents(&self) -> usize {
        self.dangling_parents
    }

    /// Renders the graph in Graphviz DOT form.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph events {\n");
        for node in &self.nodes {
            let _ = writeln!(
                dot,
                "  \"{}\" [label=\"{}\\n{} @{}\"];",
                node.key,
                node.key,
                node.stage.replace('"', "\\\""),
                node.cycle
            );
        }
        for (parent, children) in self.children.iter().enumerate() {
            for child in children {
                let _ = writeln!(
                    dot,
                    "  \"{}\" -> \"{}\";",
                    self.nodes[parent].key, self.nodes[*child].key
                );
            }
        }
        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
pub(crate) fn record(stage: &str, id: u64, parent: Option<u64>, cycle: u64) -> DecoratedRecord {
    DecoratedRecord {
        stage: stage.to_string(),
        id,
        parent,
        cycle,
        data: format!("d{cycle}"),
    }
}
