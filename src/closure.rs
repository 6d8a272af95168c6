//! Alphabet and epsilon-closure utilities consumed by the simulation engines and the subset
//! construction.

use indexmap::IndexSet;
use std::collections::{BTreeSet, VecDeque};

use crate::graph::Graph;
use crate::types::EMPTY;

/// A set of vertex names. Iteration follows insertion order.
pub type StateSet = IndexSet<String>;

/// Collects every non-EMPTY transition symbol used in the graph.
pub fn compute_alphabet(graph: &Graph) -> BTreeSet<char> {
    graph
        .edges()
        .map(|edge| edge.transition)
        .filter(|&symbol| symbol != EMPTY)
        .collect()
}

/// Returns the name of the start vertex, or `None` if the graph has none.
pub fn find_start(graph: &Graph) -> Option<&str> {
    graph
        .vertices()
        .find(|vertex| vertex.is_start)
        .map(|vertex| vertex.name.as_str())
}

/// Expands `states` in place with everything reachable over EMPTY edges and returns it.
///
/// States are expanded first-in first-out; each state is expanded at most once, so the loop
/// terminates on epsilon cycles.
pub fn closure<'s>(graph: &Graph, states: &'s mut StateSet) -> &'s mut StateSet {
    let mut worklist: VecDeque<String> = states.iter().cloned().collect();

    while let Some(state) = worklist.pop_front() {
        for edge in graph.outgoing(&state) {
            if edge.is_epsilon() && states.insert(edge.to.clone()) {
                worklist.push_back(edge.to.clone());
            }
        }
    }

    states
}

/// Returns true if any state in the set is final.
pub fn contains_final(graph: &Graph, states: &StateSet) -> bool {
    states.iter().any(|state| graph.is_final(state))
}

/// Builds the canonical label of a state-set, e.g. `{q0,q2,q10}`.
///
/// When every name is a shared non-numeric prefix followed by a number the names are ordered
/// by that number, otherwise lexicographically.
pub fn state_set_label(states: &StateSet) -> String {
    let mut names: Vec<&str> = states.iter().map(String::as_str).collect();

    let keys: Option<Vec<(&str, u64)>> = names.iter().map(|name| split_numeric(name)).collect();
    let shared_prefix = keys
        .as_ref()
        .is_some_and(|keys| keys.windows(2).all(|pair| pair[0].0 == pair[1].0));

    if shared_prefix {
        names.sort_by(|a, b| {
            let ka = split_numeric(a).map(|(_, n)| n);
            let kb = split_numeric(b).map(|(_, n)| n);
            ka.cmp(&kb).then_with(|| a.cmp(b))
        });
    } else {
        names.sort_unstable();
    }

    format!("{{{}}}", names.join(","))
}

/// Splits `q12` into `("q", 12)`. Returns `None` when there is no numeric suffix.
fn split_numeric(name: &str) -> Option<(&str, u64)> {
    let prefix = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if prefix.len() == name.len() {
        return None;
    }

    name[prefix.len()..].parse().ok().map(|n| (prefix, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Vertex};

    fn set(names: &[&str]) -> StateSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn epsilon_chain() -> Graph {
        // q0 -ε-> q1 -ε-> q2 -a-> q3, q2 -ε-> q0
        let mut graph = Graph::new();
        for name in ["q0", "q1", "q2", "q3"] {
            graph.add_vertex(Vertex::new(name)).unwrap();
        }
        graph.set_start("q0").unwrap();
        graph.set_final("q3", true).unwrap();
        graph.add_edge(Edge::new("q0", "q1", EMPTY)).unwrap();
        graph.add_edge(Edge::new("q1", "q2", EMPTY)).unwrap();
        graph.add_edge(Edge::new("q2", "q3", 'a')).unwrap();
        graph.add_edge(Edge::new("q2", "q0", EMPTY)).unwrap();
        graph.add_edge(Edge::new("q3", "q3", 'b')).unwrap();
        graph
    }

    #[test]
    fn test_compute_alphabet_skips_empty() {
        let graph = epsilon_chain();
        let alphabet: Vec<char> = compute_alphabet(&graph).into_iter().collect();
        assert_eq!(alphabet, vec!['a', 'b']);
    }

    #[test]
    fn test_find_start() {
        let graph = epsilon_chain();
        assert_eq!(find_start(&graph), Some("q0"));
        assert_eq!(find_start(&Graph::new()), None);

        let mut no_start = Graph::new();
        no_start.add_vertex(Vertex::new("q0")).unwrap();
        assert_eq!(find_start(&no_start), None);
    }

    #[test]
    fn test_closure_follows_epsilon_cycles() {
        let graph = epsilon_chain();
        let mut states = set(&["q0"]);

        closure(&graph, &mut states);

        let names: Vec<&str> = states.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["q0", "q1", "q2"]);
    }

    #[test]
    fn test_closure_is_idempotent() {
        let graph = epsilon_chain();
        let cases: [&[&str]; 4] = [&["q0"], &["q3"], &["q1", "q3"], &[]];
        for start in cases {
            let mut once = set(start);
            closure(&graph, &mut once);
            let mut twice = once.clone();
            closure(&graph, &mut twice);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_contains_final() {
        let graph = epsilon_chain();
        assert!(contains_final(&graph, &set(&["q1", "q3"])));
        assert!(!contains_final(&graph, &set(&["q0", "q1", "q2"])));
        assert!(!contains_final(&graph, &StateSet::new()));
    }

    #[test]
    fn test_label_sorts_numerically_with_shared_prefix() {
        assert_eq!(state_set_label(&set(&["q10", "q2", "q0"])), "{q0,q2,q10}");
        assert_eq!(state_set_label(&set(&["3", "12", "1"])), "{1,3,12}");
    }

    #[test]
    fn test_label_sorts_lexicographically_otherwise() {
        assert_eq!(state_set_label(&set(&["s1", "q10", "q2"])), "{q10,q2,s1}");
        assert_eq!(state_set_label(&set(&["b", "a"])), "{a,b}");
        assert_eq!(state_set_label(&StateSet::new()), "{}");
    }

    #[test]
    fn test_label_ignores_insertion_order() {
        assert_eq!(
            state_set_label(&set(&["q1", "q0"])),
            state_set_label(&set(&["q0", "q1"]))
        );
    }
}
