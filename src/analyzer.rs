//! This module provides functions for analyzing machine graphs to detect structural errors
//! before simulation. This includes checks for dangling or misplaced edges, the start vertex,
//! reachable states and, for Turing machines, determinism.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::closure::find_start;
use crate::graph::Graph;
use crate::types::{AutomatonError, MachineKind};

/// Represents the problems that can be found during the analysis of a graph.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// Edges whose `to` names a vertex that does not exist.
    DanglingEdges(Vec<String>),
    /// Edges stored in the `out` list of a vertex other than their `from`.
    MisplacedEdges(Vec<String>),
    /// The graph has vertices but no start vertex.
    MissingStartState,
    /// More than one vertex is marked as start.
    MultipleStartStates(Vec<String>),
    /// Vertices that cannot be reached from the start vertex.
    UnreachableStates(Vec<String>),
    /// Turing states with more than one edge reading the same symbol, as `state[symbol]`.
    NondeterministicStates(Vec<String>),
}

impl From<AnalysisError> for AutomatonError {
    /// Converts an `AnalysisError` into an `AutomatonError`. A missing start vertex keeps its
    /// own variant, everything else becomes `Validation`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::DanglingEdges(edges) => {
                AutomatonError::Validation(format!("Edges point to unknown vertices: {:?}", edges))
            }
            AnalysisError::MisplacedEdges(edges) => AutomatonError::Validation(format!(
                "Edges are stored on the wrong vertex: {:?}",
                edges
            )),
            AnalysisError::MissingStartState => AutomatonError::NoStartState,
            AnalysisError::MultipleStartStates(states) => {
                AutomatonError::Validation(format!("Multiple start states: {:?}", states))
            }
            AnalysisError::UnreachableStates(states) => {
                AutomatonError::Validation(format!("Unreachable states detected: {:?}", states))
            }
            AnalysisError::NondeterministicStates(states) => AutomatonError::Validation(format!(
                "Turing states read the same symbol on several edges: {:?}",
                states
            )),
        }
    }
}

/// Analyzes a graph for structural and logical errors for the given machine kind.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(AutomatonError::NoStartState)` if a non-empty graph has no start vertex.
/// * `Err(AutomatonError::Validation)` describing any other failed check.
pub fn analyze(graph: &Graph, kind: MachineKind) -> Result<(), AutomatonError> {
    let mut checks: Vec<fn(&Graph) -> Result<(), AnalysisError>> =
        vec![check_structure, check_start, check_unreachable_states];
    if kind == MachineKind::Turing {
        checks.push(check_deterministic);
    }

    match checks.iter().find_map(|check| check(graph).err()) {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Checks that every edge is stored on its `from` vertex and points at an existing vertex.
pub fn check_structure(graph: &Graph) -> Result<(), AnalysisError> {
    let misplaced: Vec<String> = graph
        .vertices()
        .flat_map(|vertex| {
            vertex
                .out
                .iter()
                .filter(|edge| edge.from != vertex.name)
                .map(|edge| edge.to_string())
        })
        .collect();
    if !misplaced.is_empty() {
        return Err(AnalysisError::MisplacedEdges(misplaced));
    }

    let dangling: Vec<String> = graph
        .edges()
        .filter(|edge| !graph.contains(&edge.to))
        .map(|edge| edge.to_string())
        .collect();
    if !dangling.is_empty() {
        return Err(AnalysisError::DanglingEdges(dangling));
    }

    Ok(())
}

/// Checks that a non-empty graph has exactly one start vertex.
pub fn check_start(graph: &Graph) -> Result<(), AnalysisError> {
    let starts: Vec<String> = graph
        .vertices()
        .filter(|vertex| vertex.is_start)
        .map(|vertex| vertex.name.clone())
        .collect();

    match starts.len() {
        0 if !graph.is_empty() => Err(AnalysisError::MissingStartState),
        0 | 1 => Ok(()),
        _ => Err(AnalysisError::MultipleStartStates(starts)),
    }
}

/// Checks for vertices that cannot be reached from the start vertex, following every edge
/// regardless of its label.
pub fn check_unreachable_states(graph: &Graph) -> Result<(), AnalysisError> {
    let Some(start) = find_start(graph) else {
        return Ok(());
    };

    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(state) = queue.pop_front() {
        for edge in graph.outgoing(state) {
            if visited.insert(edge.to.as_str()) {
                queue.push_back(edge.to.as_str());
            }
        }
    }

    let unreachable: Vec<String> = graph
        .vertices()
        .filter(|vertex| !visited.contains(vertex.name.as_str()))
        .map(|vertex| vertex.name.clone())
        .collect();

    if !unreachable.is_empty() {
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

/// Checks that no Turing state has two edges reading the same symbol. The simulator would
/// silently take the first one.
pub fn check_deterministic(graph: &Graph) -> Result<(), AnalysisError> {
    let mut conflicts = Vec::new();

    for vertex in graph.vertices() {
        let mut seen: HashMap<char, usize> = HashMap::new();
        for edge in &vertex.out {
            let count = seen.entry(edge.transition).or_insert(0);
            *count += 1;
            if *count == 2 {
                conflicts.push(format!("{}[{}]", vertex.name, edge.transition));
            }
        }
    }

    if !conflicts.is_empty() {
        return Err(AnalysisError::NondeterministicStates(conflicts));
    }

    Ok(())
}
