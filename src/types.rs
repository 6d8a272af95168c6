//! This module defines the core constants, enums and error types shared by the graph model,
//! the simulation engines and the subset construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// The distinguished EMPTY (epsilon) symbol. On a Turing tape it doubles as the blank.
pub const EMPTY: char = 'ε';
/// The default number of steps a pushdown or Turing simulation may take before giving up.
pub const DEFAULT_STEP_BUDGET: usize = 512;
/// Name of the trap vertex created by the subset construction.
pub const TRAP_STATE: &str = "∅";
/// The maximum allowed size for a graph file in bytes.
pub const MAX_GRAPH_SIZE: usize = 1 << 20; // 1MB

/// The kind of machine a graph is interpreted as.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    /// Nondeterministic finite automaton, epsilon transitions allowed.
    #[default]
    Nfa,
    /// Nondeterministic pushdown automaton accepting by final state.
    Pushdown,
    /// Deterministic single-tape Turing machine.
    Turing,
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineKind::Nfa => write!(f, "NFA"),
            MachineKind::Pushdown => write!(f, "Pushdown"),
            MachineKind::Turing => write!(f, "Turing"),
        }
    }
}

/// Head movement of a Turing transition.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    #[default]
    Right,
}

impl Direction {
    /// The head offset applied by this direction.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// Tunables for a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Pushdown: dequeued configurations. Turing: executed transitions.
    pub step_budget: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }
}

/// Represents the outcome of a single simulation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The machine performed a step and has more work to do.
    Continue,
    /// The machine has stopped with a verdict.
    Halt(Halt),
}

impl Step {
    /// Returns the verdict if the machine halted.
    pub fn verdict(&self) -> Option<bool> {
        match self {
            Step::Continue => None,
            Step::Halt(halt) => Some(halt.is_accept()),
        }
    }
}

/// The verdict of a halted machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    Accept,
    Reject(Rejection),
}

impl Halt {
    pub fn is_accept(&self) -> bool {
        matches!(self, Halt::Accept)
    }
}

/// Why a machine rejected its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// The graph has no vertices.
    EmptyGraph,
    /// The graph has vertices but none of them is marked as start.
    NoStartState,
    /// NFA: the working state-set became empty. Pushdown: every branch died.
    NoLiveConfiguration,
    /// Input was consumed but no reached state is final.
    NotFinal,
    /// Turing: no edge matches the symbol under the head.
    Stuck,
    /// The step budget ran out before a verdict was found.
    BudgetExhausted,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::EmptyGraph => "graph is empty",
            Rejection::NoStartState => "graph has no start state",
            Rejection::NoLiveConfiguration => "no live configuration left",
            Rejection::NotFinal => "ended in a non-final state",
            Rejection::Stuck => "no transition for the symbol under the head",
            Rejection::BudgetExhausted => "step budget exhausted",
        };
        write!(f, "{reason}")
    }
}

/// Represents the errors raised at the boundaries of the core: graph editing, loading,
/// regex parsing and validation. Simulation itself never fails, it rejects.
#[derive(Debug, Error)]
pub enum AutomatonError {
    /// An edge or operation refers to a vertex that does not exist.
    #[error("Unknown vertex: {0}")]
    UnknownVertex(String),
    /// A vertex with this name already exists.
    #[error("Duplicate vertex: {0}")]
    DuplicateVertex(String),
    /// An equivalent edge already exists in the graph.
    #[error("Duplicate edge: {0}")]
    DuplicateEdge(String),
    /// The graph has no start vertex.
    #[error("Graph has no start state")]
    NoStartState,
    /// Indicates an error during the parsing of a regular expression.
    #[error("Regex parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error during the validation of a graph's structure.
    #[error("Graph validation error: {0}")]
    Validation(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates malformed graph JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
    }

    #[test]
    fn test_direction_offset() {
        assert_eq!(Direction::Left.offset(), -1);
        assert_eq!(Direction::Right.offset(), 1);
    }

    #[test]
    fn test_default_options() {
        assert_eq!(SimulationOptions::default().step_budget, DEFAULT_STEP_BUDGET);

        let options: SimulationOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.step_budget, 512);
    }

    #[test]
    fn test_step_verdict() {
        assert_eq!(Step::Continue.verdict(), None);
        assert_eq!(Step::Halt(Halt::Accept).verdict(), Some(true));
        assert_eq!(
            Step::Halt(Halt::Reject(Rejection::BudgetExhausted)).verdict(),
            Some(false)
        );
    }

    #[test]
    fn test_error_display() {
        let error = AutomatonError::UnknownVertex("q7".to_string());

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Unknown vertex"));
        assert!(error_msg.contains("q7"));
    }
}
