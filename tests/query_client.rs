//! Query client tests against the Turtle fixture.

use progreval::graph::store::OntologyStore;
use progreval::graph::vocab;
use progreval::query::client::with_default_prefixes;
use progreval::query::{GraphQueryClient, SubstitutionMap, TemplateCatalog, TemplateKind};

const FIXTURE: &str = include_str!("fixtures/progreval.ttl");

fn client(seed: u64) -> GraphQueryClient<OntologyStore> {
    let store = OntologyStore::in_memory().unwrap();
    store
        .parse(FIXTURE, "urn:protege:ontology:progreval", "turtle")
        .unwrap();
    GraphQueryClient::with_seed(store, seed)
}

const EXEMPLARS: &str = "SELECT ?Exemplar WHERE { ?Exemplar progreval:esEjemploDe ?a . }";

#[tokio::test]
async fn default_prefixes_make_bare_queries_runnable() {
    let output = client(1).run(&with_default_prefixes(EXEMPLARS)).await.unwrap();
    assert_eq!(output.variables, vec!["exemplar"]);
    assert_eq!(output.rows.len(), 6);
}

#[tokio::test]
async fn trailing_limit_caps_rows() {
    let text = with_default_prefixes(&format!("{EXEMPLARS} LIMIT 2"));
    let output = client(1).run(&text).await.unwrap();
    assert_eq!(output.rows.len(), 2);

    let text = with_default_prefixes(&format!("{EXEMPLARS} LIMIT 0"));
    assert!(client(1).run(&text).await.unwrap().rows.is_empty());
}

#[tokio::test]
async fn random_order_is_reproducible_with_seed() {
    let text = with_default_prefixes(&format!("{EXEMPLARS} ORDER BY RAND() LIMIT 4"));
    let first = client(99).run(&text).await.unwrap();
    let second = client(99).run(&text).await.unwrap();
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.rows.len(), 4);
}

#[tokio::test]
async fn competency_template_binds_concept() {
    let client = client(1);
    let catalog = TemplateCatalog::builtin();
    let map = SubstitutionMap::new().bind_node("CONCEPT_URI", &vocab::progreval("Bucles"));
    let output = client
        .execute(catalog.get(TemplateKind::Competency), &map)
        .await
        .unwrap();
    assert_eq!(output.rows.len(), 2);
    assert!(output.rows.iter().all(|r| r.value("description").is_some()));
}

#[tokio::test]
async fn malformed_query_is_reported() {
    let err = client(1).run("SELECT WHERE {").await.unwrap_err();
    assert!(matches!(err, progreval::error::QueryError::Malformed { .. }));
}
