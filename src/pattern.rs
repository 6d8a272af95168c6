//! This module provides the regular-expression front end, utilizing the `pest` crate. It
//! parses a pattern into a [`Pattern`] tree and builds an equivalent epsilon-NFA graph with
//! the Thompson construction.

use pest::{iterators::Pair, Parser as PestParser};
use pest_derive::Parser as PestParser;
use tracing::debug;

use crate::graph::{Edge, Graph, Vertex};
use crate::types::{AutomatonError, EMPTY};

/// Derives a `PestParser` for the pattern grammar defined in `pattern.pest`.
#[derive(PestParser)]
#[grammar = "pattern.pest"]
pub struct PatternParser;

/// A parsed regular expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches only the empty word.
    Empty,
    Literal(char),
    Concat(Vec<Pattern>),
    Alternation(Vec<Pattern>),
    Star(Box<Pattern>),
    Plus(Box<Pattern>),
    Optional(Box<Pattern>),
}

/// Parses the given input string into a [`Pattern`].
///
/// # Returns
///
/// * `Ok(Pattern)` if the input is a well-formed pattern.
/// * `Err(AutomatonError::ParseError)` if there are any syntax errors.
pub fn parse_pattern(input: &str) -> Result<Pattern, AutomatonError> {
    let root = PatternParser::parse(Rule::pattern, input)
        .map_err(|e| AutomatonError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| AutomatonError::Validation("Empty parse tree".to_string()))?;

    // Rule: pattern > alternation, EOI
    match root.into_inner().next() {
        Some(alternation) => Ok(parse_alternation(alternation)),
        None => Ok(Pattern::Empty),
    }
}

/// Parses `input` and builds its Thompson NFA.
pub fn pattern_to_nfa(input: &str) -> Result<Graph, AutomatonError> {
    let pattern = parse_pattern(input)?;
    let graph = pattern.to_nfa();
    debug!(pattern = input, states = graph.len(), "built NFA from pattern");
    Ok(graph)
}

impl Pattern {
    /// Builds an epsilon-NFA accepting exactly the language of this pattern.
    ///
    /// Vertices are named `q0, q1, ...` in creation order; the graph has one start and one
    /// final vertex.
    pub fn to_nfa(&self) -> Graph {
        let mut builder = ThompsonBuilder::default();
        let (entry, exit) = builder.fragment(self);

        builder.vertices[entry].is_start = true;
        builder.vertices[exit].is_final = true;

        builder.vertices.into_iter().collect()
    }
}

/// Rule: alternation > [concat]
fn parse_alternation(pair: Pair<Rule>) -> Pattern {
    let mut branches: Vec<Pattern> = pair.into_inner().map(parse_concat).collect();

    match branches.len() {
        1 => branches.remove(0),
        _ => Pattern::Alternation(branches),
    }
}

/// Rule: concat > [repeat]
fn parse_concat(pair: Pair<Rule>) -> Pattern {
    let mut items: Vec<Pattern> = pair.into_inner().map(parse_repeat).collect();

    match items.len() {
        0 => Pattern::Empty,
        1 => items.remove(0),
        _ => Pattern::Concat(items),
    }
}

/// Rule: repeat > atom, [quantifier]
fn parse_repeat(pair: Pair<Rule>) -> Pattern {
    let mut inner = pair.into_inner();
    let mut pattern = match inner.next() {
        Some(atom) => parse_atom(atom),
        None => Pattern::Empty,
    };

    for quantifier in inner {
        pattern = match quantifier.as_str() {
            "*" => Pattern::Star(Box::new(pattern)),
            "+" => Pattern::Plus(Box::new(pattern)),
            _ => Pattern::Optional(Box::new(pattern)),
        };
    }

    pattern
}

fn parse_atom(pair: Pair<Rule>) -> Pattern {
    match pair.as_rule() {
        Rule::group => match pair.into_inner().next() {
            Some(alternation) => parse_alternation(alternation),
            None => Pattern::Empty,
        },
        Rule::escaped => pair
            .as_str()
            .chars()
            .nth(1)
            .map_or(Pattern::Empty, Pattern::Literal),
        Rule::literal => pair
            .as_str()
            .chars()
            .next()
            .map_or(Pattern::Empty, Pattern::Literal),
        _ => Pattern::Empty,
    }
}

/// Accumulates vertices for the Thompson construction. Every fragment gets fresh entry and
/// exit vertices, so no two edges it adds can be equal.
#[derive(Default)]
struct ThompsonBuilder {
    vertices: Vec<Vertex>,
}

impl ThompsonBuilder {
    fn state(&mut self) -> usize {
        let index = self.vertices.len();
        let x = (index % 8) as f64 * 100.0 + 50.0;
        let y = (index / 8) as f64 * 100.0 + 50.0;
        self.vertices.push(Vertex::new(format!("q{index}")).at(x, y));
        index
    }

    fn link(&mut self, from: usize, to: usize, symbol: char) {
        let edge = Edge::new(
            self.vertices[from].name.as_str(),
            self.vertices[to].name.as_str(),
            symbol,
        );
        self.vertices[from].out.push(edge);
    }

    /// Builds the fragment for `pattern` and returns its `(entry, exit)` vertices.
    fn fragment(&mut self, pattern: &Pattern) -> (usize, usize) {
        match pattern {
            Pattern::Empty => {
                let (entry, exit) = (self.state(), self.state());
                self.link(entry, exit, EMPTY);
                (entry, exit)
            }
            Pattern::Literal(symbol) => {
                let (entry, exit) = (self.state(), self.state());
                self.link(entry, exit, *symbol);
                (entry, exit)
            }
            Pattern::Concat(items) => {
                let mut parts = items.iter();
                let Some(first) = parts.next() else {
                    return self.fragment(&Pattern::Empty);
                };

                let (entry, mut exit) = self.fragment(first);
                for item in parts {
                    let (next_entry, next_exit) = self.fragment(item);
                    self.link(exit, next_entry, EMPTY);
                    exit = next_exit;
                }
                (entry, exit)
            }
            Pattern::Alternation(branches) => {
                let entry = self.state();
                let ends: Vec<(usize, usize)> =
                    branches.iter().map(|branch| self.fragment(branch)).collect();
                let exit = self.state();

                for (branch_entry, branch_exit) in ends {
                    self.link(entry, branch_entry, EMPTY);
                    self.link(branch_exit, exit, EMPTY);
                }
                (entry, exit)
            }
            Pattern::Star(inner) => {
                let entry = self.state();
                let (inner_entry, inner_exit) = self.fragment(inner);
                let exit = self.state();

                self.link(entry, inner_entry, EMPTY);
                self.link(entry, exit, EMPTY);
                self.link(inner_exit, inner_entry, EMPTY);
                self.link(inner_exit, exit, EMPTY);
                (entry, exit)
            }
            Pattern::Plus(inner) => {
                let entry = self.state();
                let (inner_entry, inner_exit) = self.fragment(inner);
                let exit = self.state();

                self.link(entry, inner_entry, EMPTY);
                self.link(inner_exit, inner_entry, EMPTY);
                self.link(inner_exit, exit, EMPTY);
                (entry, exit)
            }
            Pattern::Optional(inner) => {
                let entry = self.state();
                let (inner_entry, inner_exit) = self.fragment(inner);
                let exit = self.state();

                self.link(entry, inner_entry, EMPTY);
                self.link(entry, exit, EMPTY);
                self.link(inner_exit, exit, EMPTY);
                (entry, exit)
            }
        }
    }
}
