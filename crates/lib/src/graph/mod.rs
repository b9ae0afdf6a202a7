//! Target dependency graph.
//!
//! Targets live in a petgraph `DiGraph` with one edge per target
//! prerequisite, pointing from the dependent to the prerequisite. Edge
//! weights record declaration position so traversal honours the order in
//! which prerequisites were declared.

mod types;

use std::collections::{HashMap, HashSet};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use thiserror::Error;
use tracing::debug;

pub use types::{Action, Prerequisite, Step, Target, TargetKind, TargetSummary};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
  #[error("unknown target: {name}")]
  UnknownTarget { name: String },

  #[error("target {target} depends on unknown target {name}")]
  UnknownPrerequisite { target: String, name: String },

  #[error("duplicate target: {name}")]
  DuplicateTarget { name: String },

  #[error("dependency cycle: {}", path.join(" -> "))]
  Cycle { path: Vec<String> },
}

#[derive(Debug)]
pub struct TargetGraph {
  graph: DiGraph<Target, usize>,
  nodes: HashMap<String, NodeIndex>,
}

impl TargetGraph {
  /// Build a graph from targets in declaration order.
  ///
  /// # Errors
  ///
  /// Fails on duplicate names, prerequisites naming unknown targets, and
  /// cycles anywhere in the graph.
  pub fn new(targets: Vec<Target>) -> Result<Self, GraphError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for target in targets {
      let name = target.name.clone();
      if nodes.contains_key(&name) {
        return Err(GraphError::DuplicateTarget { name });
      }
      let idx = graph.add_node(target);
      nodes.insert(name, idx);
    }

    let mut edges = Vec::new();
    for idx in graph.node_indices() {
      let target = &graph[idx];
      for (position, prerequisite) in target.target_prerequisites().enumerate() {
        let Some(&dep_idx) = nodes.get(prerequisite) else {
          return Err(GraphError::UnknownPrerequisite {
            target: target.name.clone(),
            name: prerequisite.to_string(),
          });
        };
        edges.push((idx, dep_idx, position));
      }
    }

    for (from, to, position) in edges {
      graph.add_edge(from, to, position);
    }

    let dag = Self { graph, nodes };
    dag.verify_acyclic()?;

    debug!(targets = dag.len(), "built target graph");
    Ok(dag)
  }

  fn verify_acyclic(&self) -> Result<(), GraphError> {
    if !is_cyclic_directed(&self.graph) {
      return Ok(());
    }

    // Walk from every node to recover a concrete cycle for the error.
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    for idx in self.graph.node_indices() {
      self.visit(idx, &mut Vec::new(), &mut visited, &mut order)?;
    }

    Ok(())
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  pub fn contains(&self, name: &str) -> bool {
    self.nodes.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&Target> {
    self.nodes.get(name).map(|&idx| &self.graph[idx])
  }

  /// All targets in declaration order.
  pub fn targets(&self) -> impl Iterator<Item = &Target> {
    self.graph.node_indices().map(|idx| &self.graph[idx])
  }

  /// Direct target prerequisites of `name`, in declaration order.
  pub fn prerequisites(&self, name: &str) -> Result<Vec<&Target>, GraphError> {
    let idx = self.index(name)?;
    Ok(
      self
        .ordered_prerequisites(idx)
        .into_iter()
        .map(|dep| &self.graph[dep])
        .collect(),
    )
  }

  /// Targets needed to build `name`, prerequisites strictly before
  /// dependents, ending with `name` itself.
  pub fn resolve(&self, name: &str) -> Result<Vec<&Target>, GraphError> {
    let idx = self.index(name)?;

    let mut visited = HashSet::new();
    let mut order = Vec::new();
    self.visit(idx, &mut Vec::new(), &mut visited, &mut order)?;

    Ok(order.into_iter().map(|idx| &self.graph[idx]).collect())
  }

  fn index(&self, name: &str) -> Result<NodeIndex, GraphError> {
    self
      .nodes
      .get(name)
      .copied()
      .ok_or_else(|| GraphError::UnknownTarget { name: name.to_string() })
  }

  fn ordered_prerequisites(&self, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut edges: Vec<(usize, NodeIndex)> = self.graph.edges(idx).map(|e| (*e.weight(), e.target())).collect();
    edges.sort_by_key(|&(position, _)| position);
    edges.into_iter().map(|(_, target)| target).collect()
  }

  /// Post-order depth-first visit.
  ///
  /// `visiting` is the current path from the root; meeting a node already
  /// on it means a cycle.
  fn visit(
    &self,
    idx: NodeIndex,
    visiting: &mut Vec<NodeIndex>,
    visited: &mut HashSet<NodeIndex>,
    order: &mut Vec<NodeIndex>,
  ) -> Result<(), GraphError> {
    if visited.contains(&idx) {
      return Ok(());
    }

    if let Some(start) = visiting.iter().position(|&n| n == idx) {
      let mut path: Vec<String> = visiting[start..].iter().map(|&n| self.graph[n].name.clone()).collect();
      path.push(self.graph[idx].name.clone());
      return Err(GraphError::Cycle { path });
    }

    visiting.push(idx);
    for dep in self.ordered_prerequisites(idx) {
      self.visit(dep, visiting, visited, order)?;
    }
    visiting.pop();

    visited.insert(idx);
    order.push(idx);
    Ok(())
  }
}
