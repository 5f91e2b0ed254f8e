//! Prerequisite filtering of candidate exercises.
//!
//! Order of operations is fixed: the query client has already shuffled and
//! limited the engine output; here candidates needing a forbidden skill are
//! dropped, then the survivors are capped, then lookup-only fields are
//! stripped for display.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::OntologyResult;
use crate::graph::vocab::{self, REQUIRES_SKILL};
use crate::graph::{GraphNode, GraphStore, Row, Term};

/// Result variable naming the exemplar node; used for lookups, never displayed.
///
/// An activity template must project `?Exemplar`: while any skill is
/// forbidden, rows without it are dropped by [`PrerequisiteFilter::admits`]
/// because their prerequisites cannot be looked up.
pub const EXEMPLAR_KEY: &str = "exemplar";

/// Skills the learners were marked as lacking, captured at submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbiddenSkillSet(BTreeSet<GraphNode>);

impl ForbiddenSkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skill: GraphNode) -> bool {
        self.0.insert(skill)
    }

    pub fn contains(&self, skill: &GraphNode) -> bool {
        self.0.contains(skill)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphNode> {
        self.0.iter()
    }
}

impl FromIterator<GraphNode> for ForbiddenSkillSet {
    fn from_iter<I: IntoIterator<Item = GraphNode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One candidate exercise row plus its lookup keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateResult {
    pub exemplar: Option<GraphNode>,
    pub required_skills: BTreeSet<GraphNode>,
    pub row: Row,
}

impl CandidateResult {
    pub fn from_row(row: Row) -> Self {
        Self {
            exemplar: row.node(EXEMPLAR_KEY).cloned(),
            required_skills: BTreeSet::new(),
            row,
        }
    }

    pub fn with_required_skills(mut self, skills: impl IntoIterator<Item = GraphNode>) -> Self {
        self.required_skills.extend(skills);
        self
    }

    /// Look up `exemplar requiereManejoDe ?skill` in the store.
    pub fn attach_required_skills<S: GraphStore + ?Sized>(&mut self, store: &S) -> OntologyResult<()> {
        let Some(exemplar) = &self.exemplar else {
            return Ok(());
        };
        let requires = vocab::progreval(REQUIRES_SKILL);
        let skills = store
            .statements_matching(Some(exemplar), &requires, None)?
            .into_iter()
            .filter_map(|st| st.object.as_node().cloned());
        self.required_skills.extend(skills);
        Ok(())
    }

    /// Drop lookup fields and render the remaining columns in `variables` order.
    pub fn into_display(mut self, variables: &[String]) -> DisplayRecord {
        self.row.remove(EXEMPLAR_KEY);
        let fields = if variables.is_empty() {
            self.row
                .iter()
                .map(|(key, term)| DisplayField::new(key, Some(term)))
                .collect()
        } else {
            variables
                .iter()
                .filter(|v| v.as_str() != EXEMPLAR_KEY)
                .map(|v| DisplayField::new(v, self.row.get(v)))
                .collect()
        };
        DisplayRecord { fields }
    }
}

/// Applies a [`ForbiddenSkillSet`] to candidates.
#[derive(Debug, Clone, Copy)]
pub struct PrerequisiteFilter<'a> {
    forbidden: &'a ForbiddenSkillSet,
}

impl<'a> PrerequisiteFilter<'a> {
    pub fn new(forbidden: &'a ForbiddenSkillSet) -> Self {
        Self { forbidden }
    }

    /// Whether `candidate` survives.
    ///
    /// With a non-empty forbidden set, a candidate with no exemplar node is
    /// dropped: its prerequisites cannot be checked.
    pub fn admits(&self, candidate: &CandidateResult) -> bool {
        if self.forbidden.is_empty() {
            return true;
        }
        if candidate.exemplar.is_none() {
            return false;
        }
        !candidate
            .required_skills
            .iter()
            .any(|s| self.forbidden.contains(s))
    }

    /// Retain admitted candidates, preserving order.
    pub fn filter(&self, candidates: Vec<CandidateResult>) -> Vec<CandidateResult> {
        candidates.into_iter().filter(|c| self.admits(c)).collect()
    }

    /// Filter, then cap at `max`. Never the other way round.
    pub fn select_top(&self, candidates: Vec<CandidateResult>, max: usize) -> Vec<CandidateResult> {
        let mut kept = self.filter(candidates);
        kept.truncate(max);
        kept
    }
}

/// A display-ready value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayValue {
    Link { iri: String, text: String },
    Text { text: String },
    Empty,
}

impl DisplayValue {
    pub fn from_term(term: Option<&Term>) -> Self {
        match term {
            Some(Term::Node(node)) => DisplayValue::Link {
                iri: node.as_str().to_string(),
                text: node.local_name().to_string(),
            },
            Some(other) => DisplayValue::Text {
                text: other.value().to_string(),
            },
            None => DisplayValue::Empty,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DisplayValue::Link { text, .. } | DisplayValue::Text { text } => text,
            DisplayValue::Empty => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    pub label: String,
    pub value: DisplayValue,
}

impl DisplayField {
    fn new(key: &str, term: Option<&Term>) -> Self {
        Self {
            label: capitalize(key),
            value: DisplayValue::from_term(term),
        }
    }
}

/// One result row handed to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    pub fields: Vec<DisplayField>,
}

impl DisplayRecord {
    pub fn get(&self, label: &str) -> Option<&DisplayValue> {
        self.fields
            .iter()
            .find(|f| f.label.eq_ignore_ascii_case(label))
            .map(|f| &f.value)
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
