//! Subset construction: converts an NFA graph (epsilon edges allowed) into an equivalent DFA
//! graph whose vertices are named by canonical state-set labels.

use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::debug;

use crate::closure::{closure, compute_alphabet, contains_final, find_start, state_set_label, StateSet};
use crate::graph::{Edge, Graph, Vertex};
use crate::nfa::nfa_step;
use crate::types::TRAP_STATE;

const LAYOUT_COLUMNS: usize = 5;
const LAYOUT_SPACING: f64 = 150.0;

/// Determinizes `nfa` with the powerset construction. The input graph is not modified.
///
/// The result has one outgoing edge per alphabet symbol on every vertex. Missing successors
/// go to a trap vertex named [`TRAP_STATE`], which is left out when nothing needs it. State
/// sets are explored breadth-first and symbols in ascending order, so the output is
/// deterministic. An NFA without a start vertex yields an empty graph.
///
/// Sets are told apart by their members, not by their label: when two different sets print
/// the same (vertex names containing `,`), the later one gets a `'` suffix.
pub fn nfa_to_dfa(nfa: &Graph) -> Graph {
    let Some(start) = find_start(nfa) else {
        return Graph::new();
    };
    let alphabet = compute_alphabet(nfa);

    let mut vertices: IndexMap<String, Vertex> = IndexMap::new();
    let mut state_mapping: IndexMap<Vec<String>, String> = IndexMap::new();

    let mut trap = Vertex::new(TRAP_STATE);
    trap.out = alphabet
        .iter()
        .map(|&symbol| Edge::new(TRAP_STATE, TRAP_STATE, symbol))
        .collect();
    vertices.insert(TRAP_STATE.to_string(), trap);
    let mut trap_used = false;

    let mut start_set = StateSet::new();
    start_set.insert(start.to_string());
    closure(nfa, &mut start_set);

    let start_label = unique_label(&start_set, &vertices);
    let mut start_vertex = Vertex::new(start_label.as_str()).starting();
    start_vertex.is_final = contains_final(nfa, &start_set);
    add_laid_out(&mut vertices, start_vertex);
    state_mapping.insert(set_key(&start_set), start_label.clone());

    let mut worklist = VecDeque::from([(start_set, start_label)]);

    while let Some((states, label)) = worklist.pop_front() {
        for &symbol in &alphabet {
            let next = nfa_step(nfa, &states, symbol);

            let target = if next.is_empty() {
                trap_used = true;
                TRAP_STATE.to_string()
            } else if let Some(existing) = state_mapping.get(&set_key(&next)) {
                existing.clone()
            } else {
                let target = unique_label(&next, &vertices);
                let mut vertex = Vertex::new(target.as_str());
                vertex.is_final = contains_final(nfa, &next);
                add_laid_out(&mut vertices, vertex);
                state_mapping.insert(set_key(&next), target.clone());
                worklist.push_back((next, target.clone()));
                target
            };

            if let Some(vertex) = vertices.get_mut(&label) {
                vertex.out.push(Edge::new(label.as_str(), target, symbol));
            }
        }
    }

    let mut dfa: Graph = vertices.into_values().collect();
    if !trap_used {
        dfa.remove_vertex(TRAP_STATE);
    }

    debug!(
        nfa_states = nfa.len(),
        dfa_states = dfa.len(),
        trap_used,
        "subset construction finished"
    );

    dfa
}

/// Identity of a state-set: its members in sorted order.
fn set_key(states: &StateSet) -> Vec<String> {
    let mut key: Vec<String> = states.iter().cloned().collect();
    key.sort_unstable();
    key
}

/// The canonical label of `states`, primed until no existing vertex uses it.
fn unique_label(states: &StateSet, vertices: &IndexMap<String, Vertex>) -> String {
    let mut label = state_set_label(states);
    while vertices.contains_key(&label) {
        label.push('\'');
    }
    label
}

/// Inserts `vertex` at the next free grid slot.
fn add_laid_out(vertices: &mut IndexMap<String, Vertex>, vertex: Vertex) {
    let slot = vertices.len();
    let x = (slot % LAYOUT_COLUMNS) as f64 * LAYOUT_SPACING + LAYOUT_SPACING / 2.0;
    let y = (slot / LAYOUT_COLUMNS) as f64 * LAYOUT_SPACING + LAYOUT_SPACING / 2.0;
    let vertex = vertex.at(x, y);
    vertices.insert(vertex.name.clone(), vertex);
}
