//! Ontology graph: the read-only triple store every query runs against.
//!
//! - **Data model**: [`GraphNode`], [`Term`], [`Statement`] and result rows ([`QueryOutput`])
//! - **Store seam** ([`GraphStore`]): structured SELECT evaluation plus direct triple matching
//! - **oxigraph backend** ([`store::OntologyStore`]): in-memory store loaded once from a serialized ontology
//! - **Ready signal** ([`ready::OntologyReady`]): fires once the ontology has been parsed
//!
//! The store is never written to after loading, so queries and matches may be
//! issued concurrently without extra locking.

pub mod ready;
pub mod store;
pub mod vocab;

use std::fmt;

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::error::{OntologyError, OntologyResult, QueryResult};

/// An IRI naming an ontology individual.
///
/// Two nodes are equal iff their IRI strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphNode(String);

impl GraphNode {
    /// Parse and validate an absolute IRI.
    pub fn parse(iri: impl Into<String>) -> OntologyResult<Self> {
        let iri = iri.into();
        NamedNode::new(iri.as_str()).map_err(|_| OntologyError::InvalidIri { iri: iri.clone() })?;
        Ok(Self(iri))
    }

    /// The raw IRI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Node reference in query syntax: `<iri>`.
    pub fn as_literal(&self) -> String {
        format!("<{}>", self.0)
    }

    /// Short display name: the fragment after `#`, else the last path segment.
    pub fn local_name(&self) -> &str {
        let tail = match self.0.rsplit_once('#') {
            Some((_, fragment)) => fragment,
            None => self.0.rsplit('/').next().unwrap_or(&self.0),
        };
        if tail.is_empty() { &self.0 } else { tail }
    }
}

impl From<NamedNode> for GraphNode {
    fn from(node: NamedNode) -> Self {
        Self(node.into_string())
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value bound to a result variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Node(GraphNode),
    Blank(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl Term {
    /// Plain literal without datatype or language tag.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// The lexical value: IRI for nodes, blank id, or literal text.
    pub fn value(&self) -> &str {
        match self {
            Term::Node(node) => node.as_str(),
            Term::Blank(id) => id,
            Term::Literal { value, .. } => value,
        }
    }

    pub fn as_node(&self) -> Option<&GraphNode> {
        match self {
            Term::Node(node) => Some(node),
            _ => None,
        }
    }
}

/// A (subject, predicate, object) statement returned by direct matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: Term,
    pub predicate: GraphNode,
    pub object: Term,
}

/// One solution row; keys are normalized variable names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    bindings: Vec<(String, Term)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `variable` (normalized on insertion) to `term`.
    pub fn bind(&mut self, variable: &str, term: Term) {
        let key = normalize_variable(variable);
        match self.bindings.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = term,
            None => self.bindings.push((key, term)),
        }
    }

    pub fn with(mut self, variable: &str, term: Term) -> Self {
        self.bind(variable, term);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Term> {
        self.bindings.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    /// Lexical value of `key`, if bound.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(Term::value)
    }

    pub fn node(&self, key: &str) -> Option<&GraphNode> {
        self.get(key).and_then(Term::as_node)
    }

    pub fn remove(&mut self, key: &str) -> Option<Term> {
        let idx = self.bindings.iter().position(|(k, _)| k == key)?;
        Some(self.bindings.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Rows produced by a SELECT, in engine order, with their projected variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutput {
    /// Normalized projected variable names.
    pub variables: Vec<String>,
    pub rows: Vec<Row>,
}

/// Lower-case a variable name and strip its `?`/`$` sigil.
pub fn normalize_variable(name: &str) -> String {
    name.trim_start_matches(['?', '$']).to_lowercase()
}

/// The graph-store collaborator: structured query evaluation and direct triple lookups.
///
/// Implementations must be safe to call concurrently; the store is read-only once populated.
pub trait GraphStore: Send + Sync {
    /// Evaluate a SELECT query. The engine is not required to honor ORDER BY or LIMIT.
    fn select(&self, query: &str) -> QueryResult<QueryOutput>;

    /// All statements matching the pattern; `None` is a wildcard.
    fn statements_matching(
        &self,
        subject: Option<&GraphNode>,
        predicate: &GraphNode,
        object: Option<&GraphNode>,
    ) -> OntologyResult<Vec<Statement>>;

    /// Whether the ontology has finished loading.
    fn is_loaded(&self) -> bool {
        true
    }
}

impl<S: GraphStore + ?Sized> GraphStore for std::sync::Arc<S> {
    fn select(&self, query: &str) -> QueryResult<QueryOutput> {
        (**self).select(query)
    }

    fn statements_matching(
        &self,
        subject: Option<&GraphNode>,
        predicate: &GraphNode,
        object: Option<&GraphNode>,
    ) -> OntologyResult<Vec<Statement>> {
        (**self).statements_matching(subject, predicate, object)
    }

    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }
}
