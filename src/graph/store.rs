//! In-memory ontology store backed by oxigraph.
//!
//! Parses a serialized ontology once and then serves SELECT queries and
//! direct triple matches. Nothing in the crate writes to it afterwards.

use std::sync::atomic::{AtomicBool, Ordering};

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{GraphNameRef, NamedNodeRef};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use crate::error::{OntologyError, OntologyResult, QueryError, QueryResult};

use super::{GraphNode, GraphStore, QueryOutput, Row, Statement, Term, normalize_variable};

/// oxigraph-backed [`GraphStore`].
pub struct OntologyStore {
    store: Store,
    loaded: AtomicBool,
}

impl OntologyStore {
    /// Create an empty in-memory store.
    pub fn in_memory() -> OntologyResult<Self> {
        let store = Store::new().map_err(|e| OntologyError::Store {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self {
            store,
            loaded: AtomicBool::new(false),
        })
    }

    /// Resolve a media type (or short name) to an RDF syntax.
    pub fn resolve_format(media_type: &str) -> OntologyResult<RdfFormat> {
        let format = match media_type.trim().to_ascii_lowercase().as_str() {
            "rdfxml" | "rdf/xml" | "owl" | "xml" => Some(RdfFormat::RdfXml),
            "turtle" | "ttl" => Some(RdfFormat::Turtle),
            "ntriples" | "nt" => Some(RdfFormat::NTriples),
            other => RdfFormat::from_media_type(other),
        };
        format.ok_or_else(|| OntologyError::UnsupportedMediaType {
            media_type: media_type.to_string(),
        })
    }

    /// Load serialized ontology text into the store and mark it loaded.
    pub fn parse(&self, text: &str, base_iri: &str, media_type: &str) -> OntologyResult<()> {
        let format = Self::resolve_format(media_type)?;
        let parser = RdfParser::from_format(format)
            .with_base_iri(base_iri)
            .map_err(|_| OntologyError::InvalidBaseIri {
                iri: base_iri.to_string(),
            })?;

        self.store
            .load_from_reader(parser, text.as_bytes())
            .map_err(|e| OntologyError::Parse {
                message: e.to_string(),
            })?;

        self.loaded.store(true, Ordering::Release);
        tracing::info!(
            triples = self.len().unwrap_or(0),
            media_type,
            base_iri,
            "ontology loaded"
        );
        Ok(())
    }

    /// Read and load an ontology file.
    pub fn load_file(
        &self,
        path: &std::path::Path,
        base_iri: &str,
        media_type: &str,
    ) -> OntologyResult<()> {
        let text = std::fs::read_to_string(path).map_err(|e| OntologyError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        self.parse(&text, base_iri, media_type)
    }

    /// Number of statements in the store.
    pub fn len(&self) -> OntologyResult<usize> {
        self.store.len().map_err(|e| OntologyError::Lookup {
            message: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> OntologyResult<bool> {
        self.len().map(|n| n == 0)
    }

    fn convert_term(term: &oxigraph::model::Term) -> Term {
        use oxigraph::model::Term as OxTerm;
        match term {
            OxTerm::NamedNode(node) => Term::Node(GraphNode::from(node.clone())),
            OxTerm::BlankNode(node) => Term::Blank(node.as_str().to_string()),
            OxTerm::Literal(literal) => {
                let datatype = literal.datatype().as_str();
                Term::Literal {
                    value: literal.value().to_string(),
                    datatype: (datatype != "http://www.w3.org/2001/XMLSchema#string"
                        && literal.language().is_none())
                    .then(|| datatype.to_string()),
                    language: literal.language().map(str::to_string),
                }
            }
            #[allow(unreachable_patterns)]
            other => Term::literal(other.to_string()),
        }
    }
}

impl GraphStore for OntologyStore {
    fn select(&self, query: &str) -> QueryResult<QueryOutput> {
        if !self.is_loaded() {
            return Err(QueryError::NotReady);
        }

        #[allow(deprecated)]
        let results = self.store.query(query).map_err(|e| QueryError::Malformed {
            message: e.to_string(),
        })?;

        match results {
            QueryResults::Solutions(solutions) => {
                let variables: Vec<String> = solutions
                    .variables()
                    .iter()
                    .map(|v| normalize_variable(v.as_str()))
                    .collect();
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| QueryError::Malformed {
                        message: format!("solution error: {e}"),
                    })?;
                    let mut row = Row::new();
                    for (var, term) in solution.iter() {
                        row.bind(var.as_str(), Self::convert_term(term));
                    }
                    rows.push(row);
                }
                Ok(QueryOutput { variables, rows })
            }
            QueryResults::Boolean(_) => Err(QueryError::UnsupportedForm { form: "ASK".into() }),
            QueryResults::Graph(_) => Err(QueryError::UnsupportedForm {
                form: "CONSTRUCT/DESCRIBE".into(),
            }),
        }
    }

    fn statements_matching(
        &self,
        subject: Option<&GraphNode>,
        predicate: &GraphNode,
        object: Option<&GraphNode>,
    ) -> OntologyResult<Vec<Statement>> {
        let quads = self.store.quads_for_pattern(
            subject.map(|s| NamedNodeRef::new_unchecked(s.as_str()).into()),
            Some(NamedNodeRef::new_unchecked(predicate.as_str())),
            object.map(|o| NamedNodeRef::new_unchecked(o.as_str()).into()),
            Some(GraphNameRef::DefaultGraph),
        );

        let mut statements = Vec::new();
        for quad in quads {
            let quad = quad.map_err(|e| OntologyError::Lookup {
                message: e.to_string(),
            })?;
            let subject = oxigraph::model::Term::from(quad.subject);
            statements.push(Statement {
                subject: Self::convert_term(&subject),
                predicate: GraphNode::from(quad.predicate),
                object: Self::convert_term(&quad.object),
            });
        }
        Ok(statements)
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for OntologyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OntologyStore")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
