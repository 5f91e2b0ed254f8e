//! Rich diagnostic error types for progreval.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Errors are local to the operation that
//! raised them: a failed slot fetch or a malformed query never poisons the session.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for progreval.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ProgrevalError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Ontology errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OntologyError {
    #[error("failed to create graph store: {message}")]
    #[diagnostic(
        code(progreval::ontology::store),
        help("The in-memory oxigraph store could not be created. This is an internal failure.")
    )]
    Store { message: String },

    #[error("unsupported ontology media type: {media_type}")]
    #[diagnostic(
        code(progreval::ontology::media_type),
        help(
            "Use one of `application/rdf+xml`, `text/turtle`, `application/n-triples` \
             or the short names `rdfxml`, `turtle`, `ntriples`."
        )
    )]
    UnsupportedMediaType { media_type: String },

    #[error("invalid base IRI: {iri}")]
    #[diagnostic(
        code(progreval::ontology::base_iri),
        help("The base IRI must be an absolute IRI such as `urn:protege:ontology:progreval`.")
    )]
    InvalidBaseIri { iri: String },

    #[error("failed to parse ontology: {message}")]
    #[diagnostic(
        code(progreval::ontology::parse),
        help("Check that the file matches the declared media type and is well-formed.")
    )]
    Parse { message: String },

    #[error("failed to read ontology file: {path}")]
    #[diagnostic(
        code(progreval::ontology::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid IRI: {iri}")]
    #[diagnostic(
        code(progreval::ontology::iri),
        help("Graph nodes are named by absolute IRIs, e.g. `urn:protege:ontology:progreval#Variables`.")
    )]
    InvalidIri { iri: String },

    #[error("graph lookup failed: {message}")]
    #[diagnostic(
        code(progreval::ontology::lookup),
        help("A direct triple lookup against the store failed. This is an internal failure.")
    )]
    Lookup { message: String },
}

pub type OntologyResult<T> = std::result::Result<T, OntologyError>;

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("malformed query: {message}")]
    #[diagnostic(
        code(progreval::query::malformed),
        help(
            "The bound query text could not be parsed or evaluated. \
             Check the template for typos and unbound `{{NAME}}` placeholders."
        )
    )]
    Malformed { message: String },

    #[error("unsupported query form: {form}")]
    #[diagnostic(
        code(progreval::query::form),
        help("Only SELECT queries produce result rows. Rewrite the query as a SELECT.")
    )]
    UnsupportedForm { form: String },

    #[error("ontology is not loaded yet")]
    #[diagnostic(
        code(progreval::query::not_ready),
        help("Wait for the ontology ready signal before issuing queries.")
    )]
    NotReady,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lookup(#[from] OntologyError),
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

// ---------------------------------------------------------------------------
// Template errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("template \"{template}\" uses unknown placeholder {{{{{token}}}}}")]
    #[diagnostic(
        code(progreval::template::unknown_placeholder),
        help(
            "Placeholders must name a slot the session can supply: \
             CONCEPT_URI, PERFORMANCE_URI, AUDIENCE_URI, FORMAT_URI, COMPETENCY_URI."
        )
    )]
    UnknownPlaceholder { template: String, token: String },

    #[error("unknown template \"{name}\"")]
    #[diagnostic(
        code(progreval::template::unknown),
        help("Template overrides must use one of: concept, performance, audience, competency, format, activity.")
    )]
    UnknownTemplate { name: String },
}

pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("cannot submit: required selections missing ({missing})")]
    #[diagnostic(
        code(progreval::session::incomplete),
        help("Select a concept, competency level, performance, audience and format before submitting.")
    )]
    Incomplete { missing: String },

    #[error("\"{value}\" is not an available option for {slot}")]
    #[diagnostic(
        code(progreval::session::unknown_option),
        help("Pick one of the options currently listed for this slot.")
    )]
    UnknownOption { slot: String, value: String },

    #[error("session has not been initialized")]
    #[diagnostic(
        code(progreval::session::uninitialized),
        help("Call `initialize` (or `start`) before making selections.")
    )]
    Uninitialized,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(progreval::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(progreval::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(progreval::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("max_results must be greater than zero")]
    #[diagnostic(
        code(progreval::config::max_results),
        help("Set `max_results` to the number of example exercises to show, e.g. 3.")
    )]
    ZeroMaxResults,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience result type for top-level operations.
pub type ProgrevalResult<T> = std::result::Result<T, ProgrevalError>;
