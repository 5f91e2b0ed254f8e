// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # progreval
//!
//! Ontology-backed assistant for designing programming-assessment
//! exercises. An instructor picks a concept, a competency level, a performance,
//! a target audience and an activity format; the assistant queries the
//! ProgrEval ontology for matching example exercises and drops those whose
//! prerequisite skills the learners lack.
//!
//! ## Architecture
//!
//! - **Graph** (`graph`): oxigraph-backed ontology store behind the `GraphStore` trait
//! - **Query** (`query`): `{{TOKEN}}` templates and a client that emulates `ORDER BY RAND()` / `LIMIT`
//! - **Design** (`design`): cascading slot controller, skill matrix, prerequisite filter
//! - **Config** (`config`): TOML settings under `$XDG_CONFIG_HOME/progreval/`
//!
//! ## Library usage
//!
//! ```no_run
//! use progreval::graph::store::OntologyStore;
//! use progreval::graph::vocab;
//! use progreval::query::{GraphQueryClient, TemplateCatalog, TemplateKind, SubstitutionMap};
//!
//! # async fn run() -> progreval::error::ProgrevalResult<()> {
//! let store = OntologyStore::in_memory()?;
//! store.load_file("ProgrEval-Ontology.owl".as_ref(), "urn:protege:ontology:progreval", "rdfxml")?;
//! let client = GraphQueryClient::new(store);
//! let catalog = TemplateCatalog::builtin();
//! let concept = vocab::progreval("Variables");
//! let levels = client
//!     .execute(
//!         catalog.get(TemplateKind::Competency),
//!         &SubstitutionMap::new().bind_node("CONCEPT_URI", &concept),
//!     )
//!     .await?;
//! println!("{} competency levels", levels.rows.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod design;
pub mod error;
pub mod graph;
pub mod paths;
pub mod query;
