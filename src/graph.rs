//! This module defines the graph model shared by every other component: vertices, edges, the
//! graph container and the editing operations used by an editor front end.
//!
//! Edges are stored inside the `out` list of the vertex they leave. There is no global edge
//! set, so vertex removal and renaming walk every vertex.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::{check_structure, AnalysisError};
use crate::types::{AutomatonError, Direction, MachineKind, EMPTY};

fn empty_symbol() -> char {
    EMPTY
}

/// Canvas position of a vertex. Purely graphical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Curvature and anchor angles of an edge arrow. Purely graphical and ignored by
/// [`edge_equal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeGeometry {
    pub a1: f64,
    pub a2: f64,
    pub angle1: f64,
    pub angle2: f64,
}

/// A single transition between two vertices.
///
/// The meaning of the symbol fields depends on the machine kind the graph is run as:
/// - NFA: only `transition` is used.
/// - Pushdown: `transition` is consumed from the input, `pop_symbol` is popped from and
///   `push_symbol` pushed onto the stack.
/// - Turing: `transition` is the symbol read under the head, `push_symbol` is the symbol
///   written back and `direction` is where the head moves afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default = "empty_symbol")]
    pub transition: char,
    #[serde(default = "empty_symbol")]
    pub pop_symbol: char,
    #[serde(default = "empty_symbol")]
    pub push_symbol: char,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub geometry: EdgeGeometry,
}

impl Edge {
    /// Creates a plain NFA edge. Use [`EMPTY`] as `transition` for an epsilon edge.
    pub fn new(from: impl Into<String>, to: impl Into<String>, transition: char) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            transition,
            pop_symbol: EMPTY,
            push_symbol: EMPTY,
            direction: Direction::default(),
            geometry: EdgeGeometry::default(),
        }
    }

    /// Creates a pushdown edge `transition, pop -> push`.
    pub fn pushdown(
        from: impl Into<String>,
        to: impl Into<String>,
        transition: char,
        pop_symbol: char,
        push_symbol: char,
    ) -> Self {
        Self {
            pop_symbol,
            push_symbol,
            ..Self::new(from, to, transition)
        }
    }

    /// Creates a Turing edge `read -> write, direction`.
    pub fn turing(
        from: impl Into<String>,
        to: impl Into<String>,
        read: char,
        write: char,
        direction: Direction,
    ) -> Self {
        Self {
            push_symbol: write,
            direction,
            ..Self::new(from, to, read)
        }
    }

    pub fn with_geometry(mut self, geometry: EdgeGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn is_epsilon(&self) -> bool {
        self.transition == EMPTY
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}, {}/{}, {:?}]-> {}",
            self.from, self.transition, self.pop_symbol, self.push_symbol, self.direction, self.to
        )
    }
}

/// Structural equality of two edges. Graphical fields are ignored.
pub fn edge_equal(e1: &Edge, e2: &Edge) -> bool {
    e1.from == e2.from
        && e1.to == e2.to
        && e1.transition == e2.transition
        && e1.pop_symbol == e2.pop_symbol
        && e1.push_symbol == e2.push_symbol
        && e1.direction == e2.direction
}

/// Returns true if this exact edge object (by address) is linked into the graph.
pub fn edge_in_graph(graph: &Graph, edge: &Edge) -> bool {
    graph.edges().any(|e| std::ptr::eq(e, edge))
}

/// Returns true if the graph holds an edge structurally equal to `edge`.
pub fn edge_has_equiv_edge_in_graph(graph: &Graph, edge: &Edge) -> bool {
    graph.edges().any(|e| edge_equal(e, edge))
}

/// Returns the first edge that is [`edge_equal`] to an earlier one in the list.
fn find_duplicate_edge(edges: &[Edge]) -> Option<&Edge> {
    edges
        .iter()
        .enumerate()
        .find(|(i, edge)| edges[..*i].iter().any(|earlier| edge_equal(earlier, edge)))
        .map(|(_, edge)| edge)
}

/// A machine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub name: String,
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub out: Vec<Edge>,
    /// Label emitted on entry, for Moore-style machines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moore_output: Option<String>,
    #[serde(default)]
    pub position: Point,
}

impl Vertex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_start: false,
            is_final: false,
            out: Vec::new(),
            moore_output: None,
            position: Point::default(),
        }
    }

    pub fn starting(mut self) -> Self {
        self.is_start = true;
        self
    }

    pub fn accepting(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point { x, y };
        self
    }
}

/// A machine graph: an insertion-ordered map from vertex name to vertex.
///
/// Invariants kept by the editing operations:
/// - at most one vertex is marked as start,
/// - every edge lives in the `out` list of its `from` vertex,
/// - every edge's `to` names an existing vertex.
///
/// Serialized as a list of vertices. Deserialization checks the invariants above.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vertex>", into = "Vec<Vertex>")]
pub struct Graph {
    vertices: IndexMap<String, Vertex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vertices.contains_key(name)
    }

    pub fn vertex(&self, name: &str) -> Option<&Vertex> {
        self.vertices.get(name)
    }

    /// Iterates over vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Iterates over every edge of every vertex.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.vertices.values().flat_map(|vertex| vertex.out.iter())
    }

    /// Outgoing edges of `name` in stored order. Unknown vertices have none.
    pub fn outgoing(&self, name: &str) -> &[Edge] {
        self.vertices
            .get(name)
            .map(|vertex| vertex.out.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if `name` exists and is marked final.
    pub fn is_final(&self, name: &str) -> bool {
        self.vertices.get(name).is_some_and(|vertex| vertex.is_final)
    }

    /// Adds a vertex. Any edges it already carries must leave it and point at existing
    /// vertices (or itself). A start vertex takes the start marker from any previous one.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<(), AutomatonError> {
        if self.vertices.contains_key(&vertex.name) {
            return Err(AutomatonError::DuplicateVertex(vertex.name));
        }

        for edge in &vertex.out {
            if edge.from != vertex.name {
                return Err(AutomatonError::Validation(format!(
                    "Edge {} is stored on vertex '{}'",
                    edge, vertex.name
                )));
            }
            if edge.to != vertex.name && !self.vertices.contains_key(&edge.to) {
                return Err(AutomatonError::UnknownVertex(edge.to.clone()));
            }
        }
        if let Some(edge) = find_duplicate_edge(&vertex.out) {
            return Err(AutomatonError::DuplicateEdge(edge.to_string()));
        }

        if vertex.is_start {
            self.clear_start();
        }

        self.vertices.insert(vertex.name.clone(), vertex);
        Ok(())
    }

    /// Removes a vertex and every edge pointing at it.
    pub fn remove_vertex(&mut self, name: &str) -> Option<Vertex> {
        let removed = self.vertices.shift_remove(name)?;

        for vertex in self.vertices.values_mut() {
            vertex.out.retain(|edge| edge.to != name);
        }

        Some(removed)
    }

    /// Marks `name` as the only start vertex.
    pub fn set_start(&mut self, name: &str) -> Result<(), AutomatonError> {
        if !self.vertices.contains_key(name) {
            return Err(AutomatonError::UnknownVertex(name.to_string()));
        }

        self.clear_start();
        if let Some(vertex) = self.vertices.get_mut(name) {
            vertex.is_start = true;
        }
        Ok(())
    }

    pub fn set_final(&mut self, name: &str, is_final: bool) -> Result<(), AutomatonError> {
        let vertex = self
            .vertices
            .get_mut(name)
            .ok_or_else(|| AutomatonError::UnknownVertex(name.to_string()))?;
        vertex.is_final = is_final;
        Ok(())
    }

    /// Renames a vertex, rewriting every edge that refers to it. Order is preserved.
    pub fn rename_vertex(&mut self, old: &str, new: &str) -> Result<(), AutomatonError> {
        if !self.vertices.contains_key(old) {
            return Err(AutomatonError::UnknownVertex(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if self.vertices.contains_key(new) {
            return Err(AutomatonError::DuplicateVertex(new.to_string()));
        }

        let rename = |name: &mut String| {
            if name == old {
                *name = new.to_string();
            }
        };

        self.vertices = std::mem::take(&mut self.vertices)
            .into_iter()
            .map(|(_, mut vertex)| {
                rename(&mut vertex.name);
                for edge in vertex.out.iter_mut() {
                    rename(&mut edge.from);
                    rename(&mut edge.to);
                }
                (vertex.name.clone(), vertex)
            })
            .collect();

        Ok(())
    }

    /// Links a new edge into its `from` vertex.
    ///
    /// Declined with an error, leaving the graph untouched, when either endpoint is unknown
    /// or an equivalent edge already exists.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), AutomatonError> {
        self.check_endpoints(&edge)?;

        if edge_has_equiv_edge_in_graph(self, &edge) {
            return Err(AutomatonError::DuplicateEdge(edge.to_string()));
        }

        if let Some(vertex) = self.vertices.get_mut(&edge.from) {
            vertex.out.push(edge);
        }
        Ok(())
    }

    /// Removes the first edge structurally equal to `edge`. Returns whether one was removed.
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        let Some(vertex) = self.vertices.get_mut(&edge.from) else {
            return false;
        };

        match vertex.out.iter().position(|e| edge_equal(e, edge)) {
            Some(index) => {
                vertex.out.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replaces the `index`-th outgoing edge of `from` with `edge` and returns the old one.
    ///
    /// This is the rename/edit path: it is declined if the edited edge would collide with any
    /// *other* edge already in the graph. If `edge.from` differs from `from`, the edge moves
    /// to its new owner.
    pub fn replace_edge(
        &mut self,
        from: &str,
        index: usize,
        edge: Edge,
    ) -> Result<Edge, AutomatonError> {
        let current = self
            .vertices
            .get(from)
            .ok_or_else(|| AutomatonError::UnknownVertex(from.to_string()))?
            .out
            .get(index)
            .ok_or_else(|| {
                AutomatonError::Validation(format!("Vertex '{from}' has no edge #{index}"))
            })?;

        self.check_endpoints(&edge)?;

        if self
            .edges()
            .any(|e| !std::ptr::eq(e, current) && edge_equal(e, &edge))
        {
            return Err(AutomatonError::DuplicateEdge(edge.to_string()));
        }

        let Some(owner) = self.vertices.get_mut(from) else {
            return Err(AutomatonError::UnknownVertex(from.to_string()));
        };

        if edge.from == from {
            return Ok(std::mem::replace(&mut owner.out[index], edge));
        }

        let old = owner.out.remove(index);
        if let Some(target) = self.vertices.get_mut(&edge.from) {
            target.out.push(edge);
        }
        Ok(old)
    }

    fn check_endpoints(&self, edge: &Edge) -> Result<(), AutomatonError> {
        for name in [&edge.from, &edge.to] {
            if !self.vertices.contains_key(name) {
                return Err(AutomatonError::UnknownVertex(name.clone()));
            }
        }
        Ok(())
    }

    fn clear_start(&mut self) {
        for vertex in self.vertices.values_mut() {
            vertex.is_start = false;
        }
    }
}

/// Builds a graph without checking references. A later vertex replaces an earlier one with
/// the same name.
impl FromIterator<Vertex> for Graph {
    fn from_iter<I: IntoIterator<Item = Vertex>>(iter: I) -> Self {
        Self {
            vertices: iter
                .into_iter()
                .map(|vertex| (vertex.name.clone(), vertex))
                .collect(),
        }
    }
}

impl TryFrom<Vec<Vertex>> for Graph {
    type Error = AutomatonError;

    fn try_from(vertices: Vec<Vertex>) -> Result<Self, Self::Error> {
        let count = vertices.len();
        let graph: Graph = vertices.into_iter().collect();
        if graph.len() != count {
            return Err(AutomatonError::Validation(format!(
                "{} vertices share a name",
                count - graph.len()
            )));
        }

        check_structure(&graph)?;

        if let Some(edge) = graph
            .vertices()
            .find_map(|vertex| find_duplicate_edge(&vertex.out))
        {
            return Err(AutomatonError::DuplicateEdge(edge.to_string()));
        }

        let starts: Vec<String> = graph
            .vertices()
            .filter(|vertex| vertex.is_start)
            .map(|vertex| vertex.name.clone())
            .collect();
        if starts.len() > 1 {
            return Err(AnalysisError::MultipleStartStates(starts).into());
        }

        Ok(graph)
    }
}

impl From<Graph> for Vec<Vertex> {
    fn from(graph: Graph) -> Self {
        graph.vertices.into_values().collect()
    }
}

/// A named graph together with the machine kind it is meant to be run as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub name: String,
    pub kind: MachineKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub graph: Graph,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::new("q0").starting()).unwrap();
        graph.add_vertex(Vertex::new("q1").accepting()).unwrap();
        graph.add_vertex(Vertex::new("q2")).unwrap();
        graph.add_edge(Edge::new("q0", "q1", 'a')).unwrap();
        graph.add_edge(Edge::new("q1", "q2", 'b')).unwrap();
        graph.add_edge(Edge::new("q2", "q1", EMPTY)).unwrap();
        graph
    }

    #[test]
    fn test_edge_equal_ignores_geometry() {
        let plain = Edge::new("q0", "q1", 'a');
        let curved = Edge::new("q0", "q1", 'a').with_geometry(EdgeGeometry {
            a1: 0.3,
            a2: 1.2,
            angle1: 45.0,
            angle2: -45.0,
        });

        assert!(edge_equal(&plain, &plain));
        assert!(edge_equal(&plain, &curved));
        assert!(edge_equal(&curved, &plain));
    }

    #[test]
    fn test_edge_equal_compares_semantic_fields() {
        let base = Edge::pushdown("q0", "q1", 'a', 'Z', 'A');

        assert!(!edge_equal(&base, &Edge::pushdown("q0", "q1", 'a', 'Z', 'B')));
        assert!(!edge_equal(&base, &Edge::pushdown("q0", "q1", 'a', EMPTY, 'A')));
        assert!(!edge_equal(&base, &Edge::pushdown("q0", "q2", 'a', 'Z', 'A')));
        assert!(!edge_equal(
            &Edge::turing("q0", "q1", 'a', 'b', Direction::Left),
            &Edge::turing("q0", "q1", 'a', 'b', Direction::Right),
        ));
    }

    #[test]
    fn test_add_edge_rejects_duplicate() {
        let mut graph = sample_graph();
        let before = graph.edges().count();

        let result = graph.add_edge(Edge::new("q0", "q1", 'a'));

        assert!(matches!(result, Err(AutomatonError::DuplicateEdge(_))));
        assert_eq!(graph.edges().count(), before);
    }

    #[test]
    fn test_add_edge_rejects_unknown_vertex() {
        let mut graph = sample_graph();

        let result = graph.add_edge(Edge::new("q0", "nowhere", 'a'));

        match result {
            Err(AutomatonError::UnknownVertex(name)) => assert_eq!(name, "nowhere"),
            other => panic!("Expected UnknownVertex, got {:?}", other),
        }
    }

    #[test]
    fn test_single_start_vertex() {
        let mut graph = sample_graph();
        graph.add_vertex(Vertex::new("q3").starting()).unwrap();

        let starts: Vec<_> = graph.vertices().filter(|v| v.is_start).collect();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].name, "q3");

        graph.set_start("q1").unwrap();
        let starts: Vec<_> = graph.vertices().filter(|v| v.is_start).collect();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].name, "q1");
    }

    #[test]
    fn test_duplicate_vertex() {
        let mut graph = sample_graph();
        assert!(matches!(
            graph.add_vertex(Vertex::new("q1")),
            Err(AutomatonError::DuplicateVertex(_))
        ));
    }

    #[test]
    fn test_remove_vertex_drops_dangling_edges() {
        let mut graph = sample_graph();

        let removed = graph.remove_vertex("q1").unwrap();

        assert_eq!(removed.name, "q1");
        assert!(!graph.contains("q1"));
        assert!(graph.edges().all(|e| e.to != "q1" && e.from != "q1"));
        assert!(graph.outgoing("q0").is_empty());
    }

    #[test]
    fn test_rename_vertex_rewrites_edges() {
        let mut graph = sample_graph();

        graph.rename_vertex("q1", "accept").unwrap();

        let names: Vec<_> = graph.vertices().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["q0", "accept", "q2"]);
        assert_eq!(graph.outgoing("q0")[0].to, "accept");
        assert_eq!(graph.outgoing("accept")[0].from, "accept");
        assert_eq!(graph.outgoing("q2")[0].to, "accept");
        assert!(graph.is_final("accept"));
    }

    #[test]
    fn test_rename_vertex_collision() {
        let mut graph = sample_graph();
        assert!(matches!(
            graph.rename_vertex("q1", "q2"),
            Err(AutomatonError::DuplicateVertex(_))
        ));
        assert!(graph.contains("q1"));
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = sample_graph();

        assert!(graph.remove_edge(&Edge::new("q1", "q2", 'b')));
        assert!(!graph.remove_edge(&Edge::new("q1", "q2", 'b')));
        assert!(graph.outgoing("q1").is_empty());
    }

    #[test]
    fn test_replace_edge_in_place() {
        let mut graph = sample_graph();

        let old = graph
            .replace_edge("q0", 0, Edge::new("q0", "q1", 'c'))
            .unwrap();

        assert_eq!(old.transition, 'a');
        assert_eq!(graph.outgoing("q0")[0].transition, 'c');
    }

    #[test]
    fn test_replace_edge_with_itself_is_allowed() {
        let mut graph = sample_graph();
        assert!(graph
            .replace_edge("q0", 0, Edge::new("q0", "q1", 'a'))
            .is_ok());
    }

    #[test]
    fn test_replace_edge_collision_is_declined() {
        let mut graph = sample_graph();
        graph.add_edge(Edge::new("q0", "q1", 'b')).unwrap();

        let result = graph.replace_edge("q0", 1, Edge::new("q0", "q1", 'a'));

        assert!(matches!(result, Err(AutomatonError::DuplicateEdge(_))));
        assert_eq!(graph.outgoing("q0")[1].transition, 'b');
    }

    #[test]
    fn test_replace_edge_moves_owner() {
        let mut graph = sample_graph();

        graph
            .replace_edge("q0", 0, Edge::new("q2", "q0", 'a'))
            .unwrap();

        assert!(graph.outgoing("q0").is_empty());
        assert_eq!(graph.outgoing("q2").len(), 2);
    }

    #[test]
    fn test_edge_identity_vs_equivalence() {
        let graph = sample_graph();
        let linked = &graph.outgoing("q0")[0];
        let copy = linked.clone();

        assert!(edge_in_graph(&graph, linked));
        assert!(!edge_in_graph(&graph, &copy));
        assert!(edge_has_equiv_edge_in_graph(&graph, &copy));
        assert!(!edge_has_equiv_edge_in_graph(
            &graph,
            &Edge::new("q0", "q2", 'a')
        ));
    }

    #[test]
    fn test_deserialize_rejects_dangling_edge() {
        let json = r#"[
            {"name": "q0", "is_start": true, "out": [{"from": "q0", "to": "q9", "transition": "a"}]}
        ]"#;

        let result: Result<Graph, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_duplicate_names_and_starts() {
        let duplicate = r#"[{"name": "q0"}, {"name": "q0"}]"#;
        assert!(serde_json::from_str::<Graph>(duplicate).is_err());

        let two_starts = r#"[{"name": "q0", "is_start": true}, {"name": "q1", "is_start": true}]"#;
        assert!(serde_json::from_str::<Graph>(two_starts).is_err());
    }

    #[test]
    fn test_deserialize_rejects_duplicate_edges() {
        let json = r#"[{"name": "q0", "is_start": true, "out": [
            {"from": "q0", "to": "q0", "transition": "a"},
            {"from": "q0", "to": "q0", "transition": "a", "geometry": {"a1": 1.0, "a2": 0.0, "angle1": 0.0, "angle2": 0.0}}
        ]}]"#;

        let error = serde_json::from_str::<Graph>(json).unwrap_err();
        assert!(error.to_string().contains("Duplicate edge"), "{error}");
    }

    #[test]
    fn test_add_vertex_rejects_duplicate_edges() {
        let mut graph = sample_graph();
        let mut vertex = Vertex::new("q3");
        vertex.out.push(Edge::new("q3", "q0", 'a'));
        vertex.out.push(Edge::new("q3", "q1", 'a'));
        vertex.out.push(Edge::new("q3", "q0", 'a'));

        let result = graph.add_vertex(vertex);

        assert!(matches!(result, Err(AutomatonError::DuplicateEdge(_))));
        assert!(!graph.contains("q3"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"[
            {"name": "q0", "is_start": true, "out": [{"from": "q0", "to": "q1"}]},
            {"name": "q1", "is_final": true}
        ]"#;

        let graph: Graph = serde_json::from_str(json).unwrap();
        let edge = &graph.outgoing("q0")[0];
        assert!(edge.is_epsilon());
        assert_eq!(edge.pop_symbol, EMPTY);
        assert_eq!(edge.direction, Direction::Right);
        assert!(graph.is_final("q1"));
    }

    #[test]
    fn test_serde_round_trip_keeps_order() {
        let graph = sample_graph();

        let json = serde_json::to_string(&graph).unwrap();
        let restored: Graph = serde_json::from_str(&json).unwrap();

        let names: Vec<_> = restored.vertices().map(|v| v.name.clone()).collect();
        assert_eq!(names, vec!["q0", "q1", "q2"]);
        assert_eq!(restored.edges().count(), 3);
        assert!(restored.outgoing("q2")[0].is_epsilon());
    }
}
