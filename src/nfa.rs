//! NFA execution: one input symbol at a time over a working set of states.

use tracing::{debug, trace};

use crate::closure::{closure, contains_final, find_start, StateSet};
use crate::graph::Graph;
use crate::types::{Halt, Rejection, Step, EMPTY};

/// Returns the epsilon-closed set of states reachable from `states` by one edge labeled
/// exactly `symbol`. [`EMPTY`] is not an input symbol and yields the empty set.
pub fn nfa_step(graph: &Graph, states: &StateSet, symbol: char) -> StateSet {
    let mut next = StateSet::new();
    if symbol == EMPTY {
        return next;
    }

    for state in states {
        for edge in graph.outgoing(state) {
            if edge.transition == symbol {
                next.insert(edge.to.clone());
            }
        }
    }

    closure(graph, &mut next);
    next
}

/// Resumable NFA simulation. Each call to [`NfaRunner::step`] consumes one input symbol.
#[derive(Debug, Clone)]
pub struct NfaRunner<'g> {
    graph: &'g Graph,
    states: StateSet,
    input: Vec<char>,
    position: usize,
    halted: Option<Halt>,
}

impl<'g> NfaRunner<'g> {
    /// Prepares a run of `input` starting from the closure of the start vertex.
    pub fn new(graph: &'g Graph, input: &str) -> Self {
        let mut runner = Self {
            graph,
            states: StateSet::new(),
            input: input.chars().collect(),
            position: 0,
            halted: None,
        };

        if graph.is_empty() {
            runner.halted = Some(Halt::Reject(Rejection::EmptyGraph));
        } else if let Some(start) = find_start(graph) {
            runner.states.insert(start.to_string());
            closure(graph, &mut runner.states);
        } else {
            runner.halted = Some(Halt::Reject(Rejection::NoStartState));
        }

        runner
    }

    /// Consumes the next input symbol, or produces the verdict once input is exhausted.
    pub fn step(&mut self) -> Step {
        if let Some(halt) = &self.halted {
            return Step::Halt(halt.clone());
        }

        if self.states.is_empty() {
            debug!(position = self.position, "NFA state-set died");
            return self.halt(Halt::Reject(Rejection::NoLiveConfiguration));
        }

        let Some(&symbol) = self.input.get(self.position) else {
            return if contains_final(self.graph, &self.states) {
                self.halt(Halt::Accept)
            } else {
                self.halt(Halt::Reject(Rejection::NotFinal))
            };
        };

        self.states = nfa_step(self.graph, &self.states, symbol);
        self.position += 1;
        trace!(%symbol, states = ?self.states, "NFA step");

        Step::Continue
    }

    /// Steps until a verdict is reached.
    pub fn run(&mut self) -> Halt {
        loop {
            if let Step::Halt(halt) = self.step() {
                return halt;
            }
        }
    }

    /// The current working set of states.
    pub fn states(&self) -> &StateSet {
        &self.states
    }

    /// Number of input symbols consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    fn halt(&mut self, halt: Halt) -> Step {
        self.halted = Some(halt.clone());
        Step::Halt(halt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Vertex};

    fn single_a() -> Graph {
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("q0").starting()).unwrap();
        graph.add_vertex(Vertex::new("q1").accepting()).unwrap();
        graph.add_edge(Edge::new("q0", "q1", 'a')).unwrap();
        graph
    }

    fn accepts(graph: &Graph, input: &str) -> bool {
        NfaRunner::new(graph, input).run().is_accept()
    }

    #[test]
    fn test_single_transition() {
        let graph = single_a();
        assert!(accepts(&graph, "a"));
        assert!(!accepts(&graph, "b"));
        assert!(!accepts(&graph, ""));
        assert!(!accepts(&graph, "aa"));
    }

    #[test]
    fn test_nfa_step_applies_closure() {
        let mut graph = single_a();
        graph.add_vertex(Vertex::new("q2")).unwrap();
        graph.add_edge(Edge::new("q1", "q2", EMPTY)).unwrap();

        let start: StateSet = ["q0".to_string()].into_iter().collect();
        let next = nfa_step(&graph, &start, 'a');

        let names: Vec<&str> = next.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["q1", "q2"]);
        assert!(nfa_step(&graph, &start, 'b').is_empty());
    }

    #[test]
    fn test_empty_symbol_is_not_consumable() {
        let mut graph = single_a();
        graph.add_edge(Edge::new("q0", "q1", EMPTY)).unwrap();

        let start: StateSet = ["q0".to_string()].into_iter().collect();
        assert!(nfa_step(&graph, &start, EMPTY).is_empty());
        assert!(!accepts(&graph, "ε"));
        assert!(accepts(&graph, ""));
    }

    #[test]
    fn test_epsilon_start_closure_accepts_empty_input() {
        let mut graph = single_a();
        graph.add_edge(Edge::new("q0", "q1", EMPTY)).unwrap();

        assert!(accepts(&graph, ""));
        assert!(accepts(&graph, "a"));
    }

    #[test]
    fn test_early_rejection_when_set_dies() {
        let graph = single_a();
        let mut runner = NfaRunner::new(&graph, "bab");

        assert_eq!(runner.step(), Step::Continue);
        assert!(runner.states().is_empty());
        assert_eq!(
            runner.step(),
            Step::Halt(Halt::Reject(Rejection::NoLiveConfiguration))
        );
        assert_eq!(runner.position(), 1);
    }

    #[test]
    fn test_halt_is_sticky() {
        let graph = single_a();
        let mut runner = NfaRunner::new(&graph, "a");

        assert_eq!(runner.step(), Step::Continue);
        assert_eq!(runner.step(), Step::Halt(Halt::Accept));
        assert_eq!(runner.step(), Step::Halt(Halt::Accept));
    }

    #[test]
    fn test_empty_and_startless_graphs_reject() {
        let empty = Graph::new();
        assert_eq!(
            NfaRunner::new(&empty, "a").run(),
            Halt::Reject(Rejection::EmptyGraph)
        );

        let mut startless = Graph::new();
        startless.add_vertex(Vertex::new("q0").accepting()).unwrap();
        assert_eq!(
            NfaRunner::new(&startless, "").run(),
            Halt::Reject(Rejection::NoStartState)
        );
    }
}
