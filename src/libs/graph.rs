use crate::libs::resource::{ArtifactResourceRequirement, ResourceQuantity, Unit};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Root,
    Split,
    Coalesce,
    Align,
    Group,
    MethylationCall,
}

/// One unit of work with its advisory resource request.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub name: String,
    pub kind: TaskKind,
    pub cores: usize,
    pub memory: ResourceQuantity,
    pub disk: ResourceQuantity,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, kind: TaskKind, cores: usize, req: ArtifactResourceRequirement) -> Self {
        Self {
            name: name.into(),
            kind,
            cores,
            memory: req.memory,
            disk: req.disk,
        }
    }

    /// Bookkeeping task, one core and no footprint.
    pub fn light(name: impl Into<String>, kind: TaskKind) -> Self {
        Self::new(name, kind, 1, ArtifactResourceRequirement::none())
    }
}

impl fmt::Display for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (cores: {}, memory: {}, disk: {})",
            self.name, self.cores, self.memory, self.disk
        )
    }
}

/// Per-chromosome methylation calls get a flat request.
pub fn methylation_call_requirement() -> ArtifactResourceRequirement {
    ArtifactResourceRequirement::new(
        ResourceQuantity::new(40.0, Unit::GB),
        ResourceQuantity::new(40.0, Unit::GB),
    )
}

/// Work units and their ordering edges, grown while the run unfolds.
///
/// An edge `a -> b` means `b` may only start after `a` finished. Nodes can be
/// spawned at any time, so stages whose shape depends on earlier results are
/// added once those results exist.
#[derive(Debug, Default)]
pub struct TaskGraph {
    pub graph: DiGraph<TaskSpec, ()>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, spec: TaskSpec) -> NodeIndex {
        self.graph.add_node(spec)
    }

    /// Fan-out edge from `parent`.
    pub fn spawn_child(&mut self, parent: NodeIndex, spec: TaskSpec) -> NodeIndex {
        let node = self.graph.add_node(spec);
        self.graph.add_edge(parent, node, ());
        node
    }

    /// Fan-in: the new task waits for every predecessor.
    pub fn spawn_follow_on(&mut self, predecessors: &[NodeIndex], spec: TaskSpec) -> NodeIndex {
        let node = self.graph.add_node(spec);
        for &pred in predecessors {
            self.graph.add_edge(pred, node, ());
        }
        node
    }

    pub fn task(&self, node: NodeIndex) -> Option<&TaskSpec> {
        self.graph.node_weight(node)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn count(&self, kind: TaskKind) -> usize {
        self.graph.node_weights().filter(|t| t.kind == kind).count()
    }

    pub fn tasks_of(&self, kind: TaskKind) -> Vec<&TaskSpec> {
        self.graph.node_weights().filter(|t| t.kind == kind).collect()
    }

    /// Names of the direct predecessors of `node`.
    pub fn dependencies(&self, node: NodeIndex) -> Vec<&str> {
        self.graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .filter_map(|n| self.task(n))
            .map(|t| t.name.as_str())
            .collect()
    }

    /// A valid execution order. Edges only ever point at newer nodes, so this
    /// never fails.
    pub fn execution_order(&self) -> Vec<NodeIndex> {
        petgraph::algo::toposort(&self.graph, None).unwrap_or_default()
    }

    pub fn to_dot(&self) -> String {
        let labelled = self.graph.map(|_, t| t.to_string(), |_, _| "");
        format!("{}", Dot::with_config(&labelled, &[Config::EdgeNoLabel]))
    }
}
