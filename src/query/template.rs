//! Query templates with `{{NAME}}` placeholders.
//!
//! Binding is plain text replacement of whole tokens. Tokens with no entry in
//! the substitution map are left as-is; the engine will then reject or
//! under-constrain the query, which is the caller's concern.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{TemplateError, TemplateResult};
use crate::graph::GraphNode;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex"));

/// Placeholder name -> node reference literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    entries: BTreeMap<String, String>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `token` (without braces) to the node's `<iri>` literal.
    pub fn bind_node(mut self, token: &str, node: &GraphNode) -> Self {
        self.insert_node(token, node);
        self
    }

    pub fn insert_node(&mut self, token: &str, node: &GraphNode) {
        self.entries.insert(token.to_string(), node.as_literal());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named query text with zero or more placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub name: String,
    pub text: String,
}

impl QueryTemplate {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Distinct placeholder names, in order of first appearance.
    pub fn placeholders(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.text) {
            let token = &caps[1];
            if !seen.iter().any(|s| s == token) {
                seen.push(token.to_string());
            }
        }
        seen
    }

    /// Fail on the first placeholder not in `known`.
    pub fn validate(&self, known: &[&str]) -> TemplateResult<()> {
        match self
            .placeholders()
            .into_iter()
            .find(|token| !known.contains(&token.as_str()))
        {
            Some(token) => Err(TemplateError::UnknownPlaceholder {
                template: self.name.clone(),
                token,
            }),
            None => Ok(()),
        }
    }

    pub fn bind(&self, map: &SubstitutionMap) -> String {
        bind(&self.text, map)
    }
}

/// Replace every `{{NAME}}` that has an entry in `map`.
pub fn bind(template: &str, map: &SubstitutionMap) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match map.get(&caps[1]) {
            Some(literal) => literal.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(local: &str) -> GraphNode {
        GraphNode::parse(format!("urn:protege:ontology:progreval#{local}")).unwrap()
    }

    #[test]
    fn replaces_every_occurrence() {
        let map = SubstitutionMap::new().bind_node("X", &node("A"));
        let out = bind("?a p {{X}} . ?b q {{X}} .", &map);
        assert_eq!(
            out,
            "?a p <urn:protege:ontology:progreval#A> . ?b q <urn:protege:ontology:progreval#A> ."
        );
    }

    #[test]
    fn exact_token_only() {
        let map = SubstitutionMap::new().bind_node("X", &node("A"));
        let out = bind("{{XY}} X {{x}} {{X}}", &map);
        assert_eq!(out, "{{XY}} X {{x}} <urn:protege:ontology:progreval#A>");
    }

    #[test]
    fn unbound_tokens_are_left_alone() {
        let out = bind("SELECT * WHERE { ?s ?p {{MISSING}} }", &SubstitutionMap::new());
        assert_eq!(out, "SELECT * WHERE { ?s ?p {{MISSING}} }");
    }

    #[test]
    fn query_braces_survive() {
        let map = SubstitutionMap::new().bind_node("C", &node("A"));
        let out = bind("WHERE { OPTIONAL { ?s ?p {{C}} } }", &map);
        assert_eq!(
            out,
            "WHERE { OPTIONAL { ?s ?p <urn:protege:ontology:progreval#A> } }"
        );
    }

    #[test]
    fn placeholders_are_distinct_and_ordered() {
        let t = QueryTemplate::new("t", "{{B}} {{A}} {{B}}");
        assert_eq!(t.placeholders(), vec!["B", "A"]);
    }

    #[test]
    fn validate_flags_typos() {
        let t = QueryTemplate::new("activity", "{{CONCEPT_URI}} {{CONCPET_URI}}");
        let err = t.validate(&["CONCEPT_URI"]).unwrap_err();
        match err {
            TemplateError::UnknownPlaceholder { template, token } => {
                assert_eq!(template, "activity");
                assert_eq!(token, "CONCPET_URI");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(QueryTemplate::new("t", "{{CONCEPT_URI}}").validate(&["CONCEPT_URI"]).is_ok());
    }
}
