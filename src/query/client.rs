//! Query execution with client-side ORDER BY RAND() and LIMIT.
//!
//! The graph engine is not trusted to honor solution modifiers, so the client
//! strips them from the text, runs the unbounded query, shuffles (Fisher–Yates)
//! and then truncates. Callers filter only after this step.
//!
//! Only modifiers of the outermost query are emulated: a trailing `LIMIT n`,
//! and an `ORDER BY RAND()` right after the closing `}` whose sole key is
//! `RAND()`. Anything else (subqueries, secondary order keys) is left in the
//! text for the engine.

use std::sync::{LazyLock, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;

use crate::error::QueryResult;
use crate::graph::vocab::DEFAULT_PREFIXES;
use crate::graph::{GraphStore, QueryOutput};

use super::template::{QueryTemplate, SubstitutionMap};

static COMMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#[^\r\n]*(?:\r\n|\n|\r)?").expect("comment regex")
});
static TRAILING_RANDOM_ORDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\}(\s*ORDER\s+BY\s+RAND\s*\(\s*\)\s*)$").expect("random order regex")
});
static TRAILING_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)\s*$").expect("limit regex"));
static HAS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPREFIX\b").expect("prefix regex"));

/// Query text ready for the engine, plus the modifiers the client emulates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    /// Comment-free text with the emulated directives removed.
    pub text: String,
    /// Row cap from a trailing `LIMIT n`.
    pub limit: Option<usize>,
    /// The outer query was ordered by `RAND()` alone.
    pub random: bool,
}

impl PreparedQuery {
    pub fn prepare(raw: &str) -> Self {
        let uncommented = COMMENT_LINE.replace_all(raw, "");
        let uncommented: &str = &uncommented;

        let (body, limit) = match TRAILING_LIMIT.captures(uncommented) {
            Some(caps) => {
                // An overflowing literal caps nothing in practice.
                let limit = caps[1].parse::<usize>().unwrap_or(usize::MAX);
                let start = caps.get(0).map_or(uncommented.len(), |m| m.start());
                (&uncommented[..start], Some(limit))
            }
            None => (uncommented, None),
        };

        // SPARQL puts ORDER BY before LIMIT, so it is trailing once LIMIT is gone.
        let (text, random) = match TRAILING_RANDOM_ORDER.captures(body) {
            Some(caps) => {
                let start = caps.get(1).map_or(body.len(), |m| m.start());
                (&body[..start], true)
            }
            None => (body, false),
        };

        Self {
            text: text.trim_end().to_string(),
            limit,
            random,
        }
    }
}

/// Prepend the standard PREFIX block when the text declares none.
pub fn with_default_prefixes(text: &str) -> String {
    if HAS_PREFIX.is_match(text) {
        text.to_string()
    } else {
        format!("{DEFAULT_PREFIXES}{text}")
    }
}

/// Executes templates against a [`GraphStore`].
pub struct GraphQueryClient<S> {
    store: S,
    rng: Mutex<StdRng>,
}

impl<S: GraphStore> GraphQueryClient<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic shuffles, for reproducible runs and tests.
    pub fn with_seed(store: S, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bind `template` and run it.
    pub async fn execute(
        &self,
        template: &QueryTemplate,
        substitutions: &SubstitutionMap,
    ) -> QueryResult<QueryOutput> {
        let bound = template.bind(substitutions);
        tracing::debug!(template = %template.name, query = %bound, "executing template");
        self.run(&bound).await
    }

    /// Run raw query text.
    ///
    /// Empty or whitespace-only text is the "not configured yet" state and
    /// yields no rows.
    pub async fn run(&self, text: &str) -> QueryResult<QueryOutput> {
        if text.trim().is_empty() {
            return Ok(QueryOutput::default());
        }

        let prepared = PreparedQuery::prepare(text);
        if prepared.text.trim().is_empty() {
            return Ok(QueryOutput::default());
        }

        // Suspension point: sibling fetches interleave here.
        tokio::task::yield_now().await;

        let mut output = self.store.select(&prepared.text)?;
        let matched = output.rows.len();

        if prepared.random {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            output.rows.shuffle(&mut *rng);
        }
        if let Some(limit) = prepared.limit {
            output.rows.truncate(limit);
        }

        tracing::debug!(
            matched,
            returned = output.rows.len(),
            random = prepared.random,
            limit = ?prepared.limit,
            "query complete"
        );
        Ok(output)
    }
}

impl<S> std::fmt::Debug for GraphQueryClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQueryClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::error::{OntologyResult, QueryError};
    use crate::graph::{GraphNode, Row, Statement, Term};

    /// Returns `n` numbered rows for any query and records the text it saw.
    struct CountingStore {
        n: usize,
        seen: Mutex<Vec<String>>,
    }

    impl CountingStore {
        fn new(n: usize) -> Self {
            Self {
                n,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl GraphStore for CountingStore {
        fn select(&self, query: &str) -> QueryResult<QueryOutput> {
            self.seen.lock().unwrap().push(query.to_string());
            if query.contains("BROKEN") {
                return Err(QueryError::Malformed {
                    message: "unexpected token".into(),
                });
            }
            let rows = (0..self.n)
                .map(|i| Row::new().with("n", Term::literal(i.to_string())))
                .collect();
            Ok(QueryOutput {
                variables: vec!["n".into()],
                rows,
            })
        }

        fn statements_matching(
            &self,
            _subject: Option<&GraphNode>,
            _predicate: &GraphNode,
            _object: Option<&GraphNode>,
        ) -> OntologyResult<Vec<Statement>> {
            Ok(Vec::new())
        }
    }

    fn values(output: &QueryOutput) -> Vec<String> {
        output
            .rows
            .iter()
            .map(|r| r.value("n").unwrap().to_string())
            .collect()
    }

    #[test]
    fn prepare_strips_comment_lines() {
        let p = PreparedQuery::prepare(
            "SELECT ?s\n  # find things\nWHERE { ?s ?p <urn:x#y> }\n# trailing",
        );
        assert_eq!(p.text, "SELECT ?s\nWHERE { ?s ?p <urn:x#y> }");
        assert_eq!(p.limit, None);
        assert!(!p.random);
    }

    #[test]
    fn prepare_extracts_directives() {
        let p = PreparedQuery::prepare("SELECT ?s WHERE { ?s ?p ?o }\nORDER BY RAND()\nLIMIT 5\n");
        assert!(p.random);
        assert_eq!(p.limit, Some(5));
        assert_eq!(p.text, "SELECT ?s WHERE { ?s ?p ?o }");
    }

    #[test]
    fn prepare_ignores_inner_limit() {
        let text = "SELECT ?s WHERE { { SELECT ?s WHERE { ?s ?p ?o } LIMIT 2 } }";
        let p = PreparedQuery::prepare(text);
        assert_eq!(p.limit, None);
        assert_eq!(p.text, text);
    }

    #[test]
    fn random_order_with_secondary_key_is_left_to_engine() {
        let text = "SELECT ?e WHERE { ?e ?p ?o } ORDER BY RAND() ?e";
        let p = PreparedQuery::prepare(text);
        assert!(!p.random);
        assert_eq!(p.text, text);

        let p = PreparedQuery::prepare(&format!("{text} LIMIT 3"));
        assert!(!p.random);
        assert_eq!(p.limit, Some(3));
        assert_eq!(p.text, text);
    }

    #[test]
    fn random_order_inside_subquery_is_left_to_engine() {
        let text = "SELECT ?s WHERE { { SELECT ?s WHERE { ?s ?p ?o } ORDER BY RAND() LIMIT 2 } }";
        let p = PreparedQuery::prepare(text);
        assert!(!p.random);
        assert_eq!(p.limit, None);
        assert_eq!(p.text, text);
    }

    #[test]
    fn random_order_is_case_insensitive() {
        let p = PreparedQuery::prepare("SELECT ?s WHERE { ?s ?p ?o } order by rand ( ) limit 1");
        assert!(p.random);
        assert_eq!(p.limit, Some(1));
        assert_eq!(p.text, "SELECT ?s WHERE { ?s ?p ?o }");
    }

    #[tokio::test]
    async fn engine_keeps_secondary_order_keys() {
        let client = GraphQueryClient::new(CountingStore::new(4));
        let out = client
            .run("SELECT ?n WHERE { ?n ?p ?o } ORDER BY RAND() ?n")
            .await
            .unwrap();
        assert_eq!(values(&out), vec!["0", "1", "2", "3"]);
        let seen = client.store().seen.lock().unwrap();
        assert!(seen[0].ends_with("ORDER BY RAND() ?n"));
    }

    #[test]
    fn default_prefixes_only_when_missing() {
        let bare = with_default_prefixes("SELECT * WHERE { ?s ?p ?o }");
        assert!(bare.starts_with("PREFIX rdf:"));
        let declared = "prefix ex: <urn:ex#> SELECT * WHERE { ?s ?p ?o }";
        assert_eq!(with_default_prefixes(declared), declared);
    }

    #[tokio::test]
    async fn empty_template_yields_no_rows() {
        let client = GraphQueryClient::new(CountingStore::new(3));
        let out = client.run("   \n\t").await.unwrap();
        assert!(out.rows.is_empty());
        assert!(client.store().seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn engine_sees_unbounded_query() {
        let client = GraphQueryClient::new(CountingStore::new(10));
        let out = client
            .run("SELECT ?n WHERE { ?n ?p ?o } LIMIT 4")
            .await
            .unwrap();
        assert_eq!(out.rows.len(), 4);
        assert_eq!(values(&out), vec!["0", "1", "2", "3"]);
        let seen = client.store().seen.lock().unwrap();
        assert!(!seen[0].contains("LIMIT"));
    }

    #[tokio::test]
    async fn limit_zero_returns_nothing() {
        let client = GraphQueryClient::new(CountingStore::new(5));
        let out = client.run("SELECT ?n WHERE { ?n ?p ?o } LIMIT 0").await.unwrap();
        assert!(out.rows.is_empty());
    }

    #[tokio::test]
    async fn shuffle_then_limit_keeps_full_set() {
        let client = GraphQueryClient::with_seed(CountingStore::new(6), 7);
        let all: BTreeSet<String> = (0..6).map(|i| i.to_string()).collect();
        for _ in 0..20 {
            let out = client
                .run("SELECT ?n WHERE { ?n ?p ?o } ORDER BY RAND() LIMIT 10")
                .await
                .unwrap();
            assert_eq!(out.rows.len(), 6);
            let got: BTreeSet<String> = values(&out).into_iter().collect();
            assert_eq!(got, all);
        }
    }

    #[tokio::test]
    async fn shuffle_then_limit_caps_length() {
        let client = GraphQueryClient::with_seed(CountingStore::new(6), 11);
        let out = client
            .run("SELECT ?n WHERE { ?n ?p ?o } ORDER BY RAND() LIMIT 2")
            .await
            .unwrap();
        assert_eq!(out.rows.len(), 2);
    }

    #[tokio::test]
    async fn shuffle_produces_other_permutations() {
        let client = GraphQueryClient::with_seed(CountingStore::new(8), 3);
        let identity: Vec<String> = (0..8).map(|i| i.to_string()).collect();
        let mut moved = false;
        for _ in 0..10 {
            let out = client
                .run("SELECT ?n WHERE { ?n ?p ?o } ORDER BY RAND()")
                .await
                .unwrap();
            moved |= values(&out) != identity;
        }
        assert!(moved);
    }

    #[tokio::test]
    async fn malformed_query_surfaces_error() {
        let client = GraphQueryClient::new(CountingStore::new(1));
        let err = client.run("SELECT BROKEN").await.unwrap_err();
        assert!(matches!(err, QueryError::Malformed { .. }));
    }

    #[tokio::test]
    async fn execute_binds_before_running() {
        let client = GraphQueryClient::new(CountingStore::new(1));
        let node = GraphNode::parse("urn:protege:ontology:progreval#A").unwrap();
        let template = QueryTemplate::new("t", "SELECT ?n WHERE { ?n ?p {{X}} }");
        client
            .execute(&template, &SubstitutionMap::new().bind_node("X", &node))
            .await
            .unwrap();
        let seen = client.store().seen.lock().unwrap();
        assert!(seen[0].contains("<urn:protege:ontology:progreval#A>"));
    }
}
