//! The single entry point for running input against a graph, and a stepper that hides which
//! kind of machine is being driven.

use tracing::debug;

use crate::graph::Graph;
use crate::machine::TuringMachine;
use crate::nfa::NfaRunner;
use crate::pushdown::PushdownRunner;
use crate::types::{Halt, MachineKind, SimulationOptions, Step};

/// A resumable run of any machine kind. Drive it with [`Simulation::step`].
#[derive(Debug, Clone)]
pub enum Simulation<'g> {
    Nfa(NfaRunner<'g>),
    Pushdown(PushdownRunner<'g>),
    Turing(TuringMachine<'g>),
}

impl<'g> Simulation<'g> {
    pub fn new(graph: &'g Graph, kind: MachineKind, input: &str, options: &SimulationOptions) -> Self {
        match kind {
            MachineKind::Nfa => Simulation::Nfa(NfaRunner::new(graph, input)),
            MachineKind::Pushdown => {
                Simulation::Pushdown(PushdownRunner::new(graph, input, options))
            }
            MachineKind::Turing => Simulation::Turing(TuringMachine::new(graph, input, options)),
        }
    }

    pub fn kind(&self) -> MachineKind {
        match self {
            Simulation::Nfa(_) => MachineKind::Nfa,
            Simulation::Pushdown(_) => MachineKind::Pushdown,
            Simulation::Turing(_) => MachineKind::Turing,
        }
    }

    pub fn step(&mut self) -> Step {
        match self {
            Simulation::Nfa(runner) => runner.step(),
            Simulation::Pushdown(runner) => runner.step(),
            Simulation::Turing(machine) => machine.step(),
        }
    }

    pub fn run(&mut self) -> Halt {
        match self {
            Simulation::Nfa(runner) => runner.run(),
            Simulation::Pushdown(runner) => runner.run(),
            Simulation::Turing(machine) => machine.run(),
        }
    }
}

/// Runs `input` against `graph` interpreted as `kind` with the default step budget.
///
/// Returns `false` for an empty graph or a graph without a start vertex.
pub fn run_input(graph: &Graph, kind: MachineKind, input: &str) -> bool {
    run_input_with(graph, kind, input, &SimulationOptions::default())
}

/// Same as [`run_input`] with explicit options.
pub fn run_input_with(
    graph: &Graph,
    kind: MachineKind,
    input: &str,
    options: &SimulationOptions,
) -> bool {
    if graph.is_empty() {
        return false;
    }

    let halt = Simulation::new(graph, kind, input, options).run();
    debug!(%kind, input, ?halt, "run finished");

    halt.is_accept()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Vertex};
    use crate::types::{Rejection, EMPTY};

    fn single_a() -> Graph {
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("q0").starting()).unwrap();
        graph.add_vertex(Vertex::new("q1").accepting()).unwrap();
        graph.add_edge(Edge::new("q0", "q1", 'a')).unwrap();
        graph
    }

    #[test]
    fn test_single_edge_nfa() {
        let graph = single_a();
        assert!(run_input(&graph, MachineKind::Nfa, "a"));
        assert!(!run_input(&graph, MachineKind::Nfa, "b"));
        assert!(!run_input(&graph, MachineKind::Nfa, ""));
    }

    #[test]
    fn test_same_graph_as_pushdown() {
        // With EMPTY pop/push symbols a pushdown machine behaves like the NFA.
        let graph = single_a();
        assert!(run_input(&graph, MachineKind::Pushdown, "a"));
        assert!(!run_input(&graph, MachineKind::Pushdown, "b"));
        assert!(!run_input(&graph, MachineKind::Pushdown, ""));
    }

    #[test]
    fn test_empty_graph_rejects_every_kind() {
        let graph = Graph::new();
        for kind in [MachineKind::Nfa, MachineKind::Pushdown, MachineKind::Turing] {
            assert!(!run_input(&graph, kind, ""));
            assert!(!run_input(&graph, kind, "a"));
        }
    }

    #[test]
    fn test_startless_graph_rejects_every_kind() {
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("q0").accepting()).unwrap();
        for kind in [MachineKind::Nfa, MachineKind::Pushdown, MachineKind::Turing] {
            assert!(!run_input(&graph, kind, ""));
        }
    }

    #[test]
    fn test_stepping_matches_run() {
        let graph = single_a();
        let mut simulation =
            Simulation::new(&graph, MachineKind::Nfa, "a", &SimulationOptions::default());

        assert_eq!(simulation.kind(), MachineKind::Nfa);
        assert_eq!(simulation.step(), Step::Continue);
        assert_eq!(simulation.step().verdict(), Some(true));
    }

    #[test]
    fn test_runaway_loop_rejects_for_both_budgeted_kinds() {
        // q0 is not final and loops on EMPTY forever.
        let mut looping = Graph::new();
        looping.add_vertex(Vertex::new("q0").starting()).unwrap();
        looping
            .add_edge(Edge::pushdown("q0", "q0", EMPTY, EMPTY, 'A'))
            .unwrap();

        let options = SimulationOptions { step_budget: 16 };
        let mut pushdown = Simulation::new(&looping, MachineKind::Pushdown, "a", &options);
        assert_eq!(pushdown.run(), Halt::Reject(Rejection::BudgetExhausted));

        let mut turing = Simulation::new(&looping, MachineKind::Turing, "", &options);
        assert_eq!(turing.run(), Halt::Reject(Rejection::BudgetExhausted));
    }
}
