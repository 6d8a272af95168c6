//! This crate provides the core logic for an automaton simulator.
//! It includes the graph model shared by NFAs, pushdown automata and Turing machines, the
//! simulation engines for each kind, the subset construction, a regular-expression front end,
//! graph analysis, and a library of bundled machines.

pub mod analyzer;
pub mod closure;
pub mod graph;
pub mod library;
pub mod loader;
pub mod machine;
pub mod nfa;
pub mod pattern;
pub mod pushdown;
pub mod simulation;
pub mod subset;
pub mod types;

/// Re-exports the `Rule` enum from the pattern module, used by the `pest` grammar.
pub use crate::pattern::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the epsilon-closure helpers.
pub use closure::{closure, compute_alphabet, find_start, state_set_label, StateSet};
/// Re-exports the graph model.
pub use graph::{Edge, EdgeGeometry, Graph, Machine, Point, Vertex};
/// Re-exports `MachineInfo`, `MachineLibrary`, and `MACHINES` from the library module.
pub use library::{MachineInfo, MachineLibrary, MACHINES};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the `TuringMachine` struct from the machine module.
pub use machine::TuringMachine;
pub use nfa::{nfa_step, NfaRunner};
/// Re-exports the pattern parser and Thompson construction.
pub use pattern::{parse_pattern, pattern_to_nfa, Pattern};
pub use pushdown::{Configuration, PushdownRunner};
/// Re-exports the simulation entry points.
pub use simulation::{run_input, run_input_with, Simulation};
/// Re-exports the subset construction.
pub use subset::nfa_to_dfa;
/// Re-exports the shared constants, enums and error type from the types module.
pub use types::{
    AutomatonError, Direction, Halt, MachineKind, Rejection, SimulationOptions, Step,
    DEFAULT_STEP_BUDGET, EMPTY, MAX_GRAPH_SIZE, TRAP_STATE,
};
