//! This module defines the `TuringMachine` struct, which runs a graph as a deterministic
//! single-tape Turing machine. It handles the current state, the sparse tape, head movement
//! and the step budget.

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::closure::find_start;
use crate::graph::{Edge, Graph};
use crate::types::{Halt, Rejection, SimulationOptions, Step, EMPTY};

/// A deterministic Turing machine over a graph.
///
/// The tape is a sparse map from position to symbol, so the head may wander to negative
/// positions. Unset cells read as [`EMPTY`].
///
/// Edges are matched first-come: when several edges of a state read the same symbol the one
/// listed first wins. The machine does not reject such graphs; see
/// [`crate::analyzer::check_deterministic`] for a validation pass.
#[derive(Debug, Clone)]
pub struct TuringMachine<'g> {
    graph: &'g Graph,
    input: String,
    state: String,
    tape: HashMap<i64, char>,
    head: i64,
    budget: usize,
    step_count: usize,
    halted: Option<Halt>,
}

impl<'g> TuringMachine<'g> {
    /// Creates a machine positioned on the start vertex with `input` written at `0..len`.
    pub fn new(graph: &'g Graph, input: &str, options: &SimulationOptions) -> Self {
        let mut machine = Self {
            graph,
            input: input.to_string(),
            state: String::new(),
            tape: HashMap::new(),
            head: 0,
            budget: options.step_budget,
            step_count: 0,
            halted: None,
        };
        machine.reset();
        machine
    }

    /// Executes a single transition.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if a transition was taken.
    /// * `Step::Halt(_)` once the machine is in a final state, is stuck, or ran out of budget.
    ///   In all three cases the verdict is whether the current state is final.
    pub fn step(&mut self) -> Step {
        if let Some(halt) = &self.halted {
            return Step::Halt(halt.clone());
        }

        if self.graph.is_final(&self.state) {
            debug!(state = %self.state, steps = self.step_count, "Turing machine accepted");
            return self.halt(Halt::Accept);
        }

        if self.step_count >= self.budget {
            debug!(budget = self.budget, state = %self.state, "Turing machine ran out of budget");
            return self.settle(Rejection::BudgetExhausted);
        }

        let Some(transition) = self.transition().cloned() else {
            debug!(state = %self.state, symbol = %self.symbol(), "Turing machine is stuck");
            return self.settle(Rejection::Stuck);
        };

        if transition.push_symbol == EMPTY {
            self.tape.remove(&self.head);
        } else {
            self.tape.insert(self.head, transition.push_symbol);
        }

        self.head += transition.direction.offset();
        self.state = transition.to;
        self.step_count += 1;
        trace!(state = %self.state, head = self.head, "Turing step");

        Step::Continue
    }

    /// Runs the machine until it halts.
    pub fn run(&mut self) -> Halt {
        loop {
            if let Step::Halt(halt) = self.step() {
                return halt;
            }
        }
    }

    /// Restores the start state, the original input and head position 0.
    pub fn reset(&mut self) {
        self.tape = self
            .input
            .chars()
            .enumerate()
            .map(|(i, symbol)| (i as i64, symbol))
            .collect();
        self.head = 0;
        self.step_count = 0;
        self.halted = None;
        self.state.clear();

        if self.graph.is_empty() {
            self.halted = Some(Halt::Reject(Rejection::EmptyGraph));
        } else if let Some(start) = find_start(self.graph) {
            self.state = start.to_string();
        } else {
            self.halted = Some(Halt::Reject(Rejection::NoStartState));
        }
    }

    /// Returns the current state of the machine.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the head position.
    pub fn head(&self) -> i64 {
        self.head
    }

    /// Returns the number of transitions taken.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Returns the symbol under the head.
    pub fn symbol(&self) -> char {
        self.read(self.head)
    }

    /// Returns the symbol at `position`, [`EMPTY`] if the cell was never written.
    pub fn read(&self, position: i64) -> char {
        self.tape.get(&position).copied().unwrap_or(EMPTY)
    }

    /// Renders the written part of the tape, from the leftmost to the rightmost non-empty
    /// cell. Gaps are shown as [`EMPTY`].
    pub fn tape_contents(&self) -> String {
        let (Some(&min), Some(&max)) = (self.tape.keys().min(), self.tape.keys().max()) else {
            return String::new();
        };

        (min..=max).map(|position| self.read(position)).collect()
    }

    /// Finds the first edge of the current state that reads the symbol under the head.
    pub fn transition(&self) -> Option<&'g Edge> {
        let symbol = self.symbol();
        self.graph
            .outgoing(&self.state)
            .iter()
            .find(|edge| edge.transition == symbol)
    }

    /// Halts with the verdict "is the current state final", whatever stopped the machine.
    fn settle(&mut self, reason: Rejection) -> Step {
        if self.graph.is_final(&self.state) {
            self.halt(Halt::Accept)
        } else {
            self.halt(Halt::Reject(reason))
        }
    }

    fn halt(&mut self, halt: Halt) -> Step {
        self.halted = Some(halt.clone());
        Step::Halt(halt)
    }
}
