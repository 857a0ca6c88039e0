//! Pattern dependency graph and generation order.
//!
//! Edges point from a node to the nodes it depends on. The generation order is a
//! depth-first post-order over the nodes in insertion order, so every dependency
//! precedes its dependents. A back edge is reported as [`Error::DependencyCycle`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::core::error::{Error, Result};

use super::kinds::{GlobalPattern, ToolPattern};

/// Graph node: a global pattern or one pattern applied to one tool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Global(GlobalPattern),
    Tool { tool: String, pattern: ToolPattern },
}

impl NodeId {
    pub fn tool(tool: impl Into<String>, pattern: ToolPattern) -> Self {
        NodeId::Tool {
            tool: tool.into(),
            pattern,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Global(pattern) => write!(f, "{pattern}"),
            NodeId::Tool { tool, pattern } => write!(f, "{tool}:{pattern}"),
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Dependency graph over selected patterns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraph {
    nodes: Vec<NodeId>,
    edges: BTreeMap<NodeId, Vec<NodeId>>,
    required_global: Vec<GlobalPattern>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; adding an existing node is a no-op
    pub fn add_node(&mut self, node: NodeId) {
        if self.contains(&node) {
            return;
        }
        if let NodeId::Global(pattern) = &node {
            self.required_global.push(*pattern);
        }
        self.edges.entry(node.clone()).or_default();
        self.nodes.push(node);
    }

    /// Record that `from` depends on `to`. Both ends are added as nodes.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.add_node(from.clone());
        self.add_node(to.clone());
        let deps = self.edges.entry(from).or_default();
        if !deps.contains(&to) {
            deps.push(to);
        }
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.edges.contains_key(node)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn edges(&self) -> &BTreeMap<NodeId, Vec<NodeId>> {
        &self.edges
    }

    pub fn required_global(&self) -> &[GlobalPattern] {
        &self.required_global
    }

    pub fn dependencies_of(&self, node: &NodeId) -> &[NodeId] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Topological order with dependencies first
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        let mut marks: HashMap<&NodeId, Mark> = HashMap::with_capacity(self.nodes.len());
        let mut path: Vec<&NodeId> = Vec::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            self.visit(node, &mut marks, &mut path, &mut order)?;
        }

        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        node: &'a NodeId,
        marks: &mut HashMap<&'a NodeId, Mark>,
        path: &mut Vec<&'a NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<()> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let start = path.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(node.to_string());
                return Err(Error::DependencyCycle(cycle));
            }
            None => {}
        }

        marks.insert(node, Mark::InProgress);
        path.push(node);
        for dep in self.dependencies_of(node) {
            self.visit(dep, marks, path, order)?;
        }
        path.pop();
        marks.insert(node, Mark::Done);
        order.push(node.clone());
        Ok(())
    }
}
