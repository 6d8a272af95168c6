//! Pushdown automaton execution as a breadth-first search over configurations.
//!
//! Acceptance is by final state: a configuration accepts when its vertex is final and the
//! input is exhausted, whatever is left on the stack. The search is bounded by a step budget
//! counted in dequeued configurations; running out of budget rejects.

use std::collections::VecDeque;
use tracing::{debug, trace, warn};

use crate::closure::find_start;
use crate::graph::{Edge, Graph};
use crate::types::{Halt, Rejection, SimulationOptions, Step, EMPTY};

/// One node of the search: where the machine is, what is on its stack and what input is left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub vertex: String,
    /// Stack contents, top is the last element.
    pub stack: Vec<char>,
    /// Unconsumed input stored back to front, so the next symbol is the last element.
    remaining: Vec<char>,
}

impl Configuration {
    fn initial(vertex: &str, input: &str) -> Self {
        Self {
            vertex: vertex.to_string(),
            stack: Vec::new(),
            remaining: input.chars().rev().collect(),
        }
    }

    /// The unconsumed input in reading order.
    pub fn remaining_input(&self) -> String {
        self.remaining.iter().rev().collect()
    }

    pub fn is_input_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Returns the configuration reached by taking `edge`, if the edge is enabled here.
    /// The successor owns fresh copies of stack and input.
    fn follow(&self, edge: &Edge) -> Option<Configuration> {
        let reads = edge.transition != EMPTY;
        let pops = edge.pop_symbol != EMPTY;

        if reads && self.remaining.last() != Some(&edge.transition) {
            return None;
        }
        if pops && self.stack.last() != Some(&edge.pop_symbol) {
            return None;
        }

        let mut next = Configuration {
            vertex: edge.to.clone(),
            stack: self.stack.clone(),
            remaining: self.remaining.clone(),
        };

        if reads {
            next.remaining.pop();
        }
        if pops {
            next.stack.pop();
        }
        if edge.push_symbol != EMPTY {
            next.stack.push(edge.push_symbol);
        }

        Some(next)
    }
}

/// Resumable pushdown simulation. Each call to [`PushdownRunner::step`] dequeues and expands
/// one configuration.
#[derive(Debug, Clone)]
pub struct PushdownRunner<'g> {
    graph: &'g Graph,
    queue: VecDeque<Configuration>,
    budget: usize,
    steps: usize,
    halted: Option<Halt>,
}

impl<'g> PushdownRunner<'g> {
    pub fn new(graph: &'g Graph, input: &str, options: &SimulationOptions) -> Self {
        let mut runner = Self {
            graph,
            queue: VecDeque::new(),
            budget: options.step_budget,
            steps: 0,
            halted: None,
        };

        if graph.is_empty() {
            runner.halted = Some(Halt::Reject(Rejection::EmptyGraph));
        } else if let Some(start) = find_start(graph) {
            runner.queue.push_back(Configuration::initial(start, input));
        } else {
            runner.halted = Some(Halt::Reject(Rejection::NoStartState));
        }

        runner
    }

    pub fn step(&mut self) -> Step {
        if let Some(halt) = &self.halted {
            return Step::Halt(halt.clone());
        }

        if self.steps >= self.budget {
            warn!(
                budget = self.budget,
                pending = self.queue.len(),
                "pushdown search ran out of budget"
            );
            return self.halt(Halt::Reject(Rejection::BudgetExhausted));
        }

        let Some(config) = self.queue.pop_front() else {
            debug!(steps = self.steps, "pushdown search exhausted every branch");
            return self.halt(Halt::Reject(Rejection::NoLiveConfiguration));
        };
        self.steps += 1;

        if config.is_input_exhausted() && self.graph.is_final(&config.vertex) {
            debug!(steps = self.steps, vertex = %config.vertex, "pushdown accepted");
            return self.halt(Halt::Accept);
        }

        for edge in self.graph.outgoing(&config.vertex) {
            if let Some(next) = config.follow(edge) {
                trace!(
                    vertex = %next.vertex,
                    stack = ?next.stack,
                    remaining = %next.remaining_input(),
                    "enqueue"
                );
                self.queue.push_back(next);
            }
        }

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

    /// Number of configurations dequeued so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Configurations waiting to be explored, in the order they will be dequeued.
    pub fn pending(&self) -> impl Iterator<Item = &Configuration> {
        self.queue.iter()
    }

    fn halt(&mut self, halt: Halt) -> Step {
        self.halted = Some(halt.clone());
        Step::Halt(halt)
    }
}
