//! Built-in query templates for the exercise design session.
//!
//! Every template can be replaced from configuration. Replacements go through
//! the same placeholder validation as the built-ins, so a misspelled token is
//! rejected at load time instead of silently widening a query.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{TemplateError, TemplateResult};

use super::template::QueryTemplate;

pub const CONCEPT_URI: &str = "CONCEPT_URI";
pub const PERFORMANCE_URI: &str = "PERFORMANCE_URI";
pub const AUDIENCE_URI: &str = "AUDIENCE_URI";
pub const FORMAT_URI: &str = "FORMAT_URI";
pub const COMPETENCY_URI: &str = "COMPETENCY_URI";

/// Placeholder names the session can supply.
pub const KNOWN_PLACEHOLDERS: [&str; 5] = [
    CONCEPT_URI,
    PERFORMANCE_URI,
    AUDIENCE_URI,
    FORMAT_URI,
    COMPETENCY_URI,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateKind {
    Concept,
    Performance,
    Audience,
    Competency,
    Format,
    Activity,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        TemplateKind::Concept,
        TemplateKind::Performance,
        TemplateKind::Audience,
        TemplateKind::Competency,
        TemplateKind::Format,
        TemplateKind::Activity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::Concept => "concept",
            TemplateKind::Performance => "performance",
            TemplateKind::Audience => "audience",
            TemplateKind::Competency => "competency",
            TemplateKind::Format => "format",
            TemplateKind::Activity => "activity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    fn builtin(self) -> &'static str {
        match self {
            TemplateKind::Concept => CONCEPT_QUERY,
            TemplateKind::Performance => PERFORMANCE_QUERY,
            TemplateKind::Audience => AUDIENCE_QUERY,
            TemplateKind::Competency => COMPETENCY_QUERY,
            TemplateKind::Format => FORMAT_QUERY,
            TemplateKind::Activity => ACTIVITY_QUERY,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One validated template per [`TemplateKind`].
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<QueryTemplate>,
}

impl TemplateCatalog {
    /// The built-in templates.
    pub fn builtin() -> Self {
        Self {
            templates: TemplateKind::ALL
                .iter()
                .map(|k| QueryTemplate::new(k.name(), k.builtin()))
                .collect(),
        }
    }

    /// Built-ins with named replacements applied, then validated.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> TemplateResult<Self> {
        let mut catalog = Self::builtin();
        for (name, text) in overrides {
            let kind = TemplateKind::from_name(name)
                .ok_or_else(|| TemplateError::UnknownTemplate { name: name.clone() })?;
            catalog.templates[kind as usize] = QueryTemplate::new(kind.name(), text.clone());
            tracing::debug!(template = %kind, "template overridden from config");
        }
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn get(&self, kind: TemplateKind) -> &QueryTemplate {
        &self.templates[kind as usize]
    }

    /// Check every token against [`KNOWN_PLACEHOLDERS`].
    pub fn validate(&self) -> TemplateResult<()> {
        self.templates
            .iter()
            .try_for_each(|t| t.validate(&KNOWN_PLACEHOLDERS))
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

const CONCEPT_QUERY: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dc: <http://purl.org/dc/elements/1.1/>
PREFIX progreval: <urn:protege:ontology:progreval#>

SELECT ?Label ?Instance_URI ?Description
WHERE {
    ?Instance_URI a progreval:Concepto-Fundamental .
    ?Instance_URI rdfs:label ?Label .
    OPTIONAL { ?Instance_URI dc:description ?Description . }
}";

const PERFORMANCE_QUERY: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dc: <http://purl.org/dc/elements/1.1/>
PREFIX progreval: <urn:protege:ontology:progreval#>

SELECT ?Label ?Instance_URI ?Description
WHERE {
    ?Instance_URI a progreval:Desempeño .
    ?Instance_URI rdfs:label ?Label .
    OPTIONAL { ?Instance_URI dc:description ?Description . }
}";

const AUDIENCE_QUERY: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dc: <http://purl.org/dc/elements/1.1/>
PREFIX progreval: <urn:protege:ontology:progreval#>

SELECT ?Label ?Instance_URI ?Description
WHERE {
    ?Instance_URI a progreval:Publico-Objetivo .
    ?Instance_URI rdfs:label ?Label .
    OPTIONAL { ?Instance_URI dc:description ?Description . }
}";

const COMPETENCY_QUERY: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dc: <http://purl.org/dc/elements/1.1/>
PREFIX progreval: <urn:protege:ontology:progreval#>

SELECT ?Label ?Instance_URI ?Description ?Order
WHERE {
    ?Instance_URI a progreval:Nivel-de-Competencia .
    ?Instance_URI rdfs:label ?Label .
    ?Instance_URI progreval:orden ?Order .
    # Level description specific to the selected concept
    OPTIONAL {
        ?level_for_concept a progreval:Competencia-por-Concepto .
        ?level_for_concept progreval:nivel ?Instance_URI .
        ?level_for_concept progreval:concepto {{CONCEPT_URI}} .
        ?level_for_concept dc:description ?Description .
    }
}";

const FORMAT_QUERY: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dc: <http://purl.org/dc/elements/1.1/>
PREFIX progreval: <urn:protege:ontology:progreval#>

SELECT ?Label ?Instance_URI ?Description ?Effort ?Effort_URI ?Order
WHERE {
    ?Instance_URI a progreval:Formato-Actividad .
    ?Instance_URI rdfs:label ?Label .
    OPTIONAL { ?Instance_URI dc:description ?Description . }
    OPTIONAL {
        ?Instance_URI progreval:conllevaEsfuerzoDeCorreccion ?Effort_URI .
        ?Effort_URI rdfs:label ?Effort .
        ?Effort_URI progreval:orden ?Order .
    }
}";

const ACTIVITY_QUERY: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX progreval: <urn:protege:ontology:progreval#>

SELECT ?Exemplar ?Activity ?Prompt ?Answer
WHERE {
    # Activities assessing the concept and the performance in the chosen format
    ?Activity progreval:evalua {{CONCEPT_URI}} ;
              progreval:evalua {{PERFORMANCE_URI}} ;
              progreval:usaFormato {{FORMAT_URI}} .

    # Exemplars of those activities for the audience and competency level
    ?Exemplar progreval:esEjemploDe ?Activity ;
              progreval:apuntadoA {{AUDIENCE_URI}} ;
              progreval:evaluaConceptoANivel {{COMPETENCY_URI}} .

    OPTIONAL { ?Exemplar progreval:Enunciado ?Prompt . }
    OPTIONAL { ?Exemplar progreval:Respuesta-Posible ?Answer . }
    OPTIONAL { ?Exemplar progreval:Respuesta ?Answer . }
}
ORDER BY RAND()";
