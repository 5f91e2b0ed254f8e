//! Parameterized queries: templating, the built-in catalog, and execution.
//!
//! - **Templates** ([`template`]): `{{NAME}}` placeholders bound to node literals
//! - **Catalog** ([`catalog`]): the session's six templates, validated against known placeholders
//! - **Client** ([`client`]): runs bound text, emulating `ORDER BY RAND()` and `LIMIT`

pub mod catalog;
pub mod client;
pub mod template;

pub use catalog::{TemplateCatalog, TemplateKind};
pub use client::{GraphQueryClient, PreparedQuery};
pub use template::{QueryTemplate, SubstitutionMap, bind};
