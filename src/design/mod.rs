//! Exercise design session.
//!
//! An instructor fills five parameter slots (concept, competency level,
//! performance, audience, activity format), marks the prerequisite skills the
//! learners already have, and gets back up to three example exercises.
//!
//! - **Options** ([`SlotOption`]): one selectable choice, ordered by `order` when present
//! - **Slots** ([`slots`]): per-slot state machine with stale-fetch discarding
//! - **Skill matrix** ([`matrix`]): concept × performance prerequisite cells and the checklist over them
//! - **Filter** ([`filter`]): drops candidates that need a skill the learners lack
//! - **Validity** ([`validity`]): submission gating
//! - **Session** ([`session`]): the cascading controller tying it together

pub mod filter;
pub mod matrix;
pub mod session;
pub mod slots;
pub mod validity;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{GraphNode, Row};
use crate::query::catalog;

pub use filter::{CandidateResult, DisplayRecord, DisplayValue, ForbiddenSkillSet, PrerequisiteFilter};
pub use matrix::{SkillChecklist, SkillMatrix, SkillMatrixResolver};
pub use session::{DesignSession, DesignView, SessionState, SlotPrompt, Submission};
pub use slots::{FetchTicket, ParameterSlot, SlotState};
pub use validity::ValidityTracker;

/// The parameter slots of a design session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    Concept,
    Performance,
    Audience,
    Competency,
    /// Correction-effort bucket; narrows the format list, never submitted.
    Effort,
    Format,
}

impl SlotId {
    pub const ALL: [SlotId; 6] = [
        SlotId::Concept,
        SlotId::Performance,
        SlotId::Audience,
        SlotId::Competency,
        SlotId::Effort,
        SlotId::Format,
    ];

    /// Template placeholder this slot's selection binds, if any.
    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            SlotId::Concept => Some(catalog::CONCEPT_URI),
            SlotId::Performance => Some(catalog::PERFORMANCE_URI),
            SlotId::Audience => Some(catalog::AUDIENCE_URI),
            SlotId::Competency => Some(catalog::COMPETENCY_URI),
            SlotId::Format => Some(catalog::FORMAT_URI),
            SlotId::Effort => None,
        }
    }

    /// Upstream slot whose value constrains this one.
    pub fn upstream(self) -> Option<SlotId> {
        match self {
            SlotId::Competency => Some(SlotId::Concept),
            SlotId::Format => Some(SlotId::Effort),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SlotId::Concept => "concept",
            SlotId::Performance => "performance",
            SlotId::Audience => "audience",
            SlotId::Competency => "competency",
            SlotId::Effort => "effort",
            SlotId::Format => "format",
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One selectable choice in a parameter slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOption {
    pub label: String,
    pub uri: GraphNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Effort bucket a format belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GraphNode>,
}

impl SlotOption {
    pub fn new(label: impl Into<String>, uri: GraphNode) -> Self {
        Self {
            label: label.into(),
            uri,
            description: None,
            order: None,
            group: None,
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_group(mut self, group: GraphNode) -> Self {
        self.group = Some(group);
        self
    }

    /// Build from a normalized result row (`instance_uri`, `label`,
    /// `description`, `order`, `effort_uri`). Rows without a node are skipped.
    pub fn from_row(row: &Row) -> Option<Self> {
        let uri = row.node("instance_uri")?.clone();
        let label = row
            .value("label")
            .map(str::to_string)
            .unwrap_or_else(|| uri.local_name().to_string());
        Some(Self {
            label,
            description: row.value("description").map(str::to_string),
            order: row.value("order").and_then(parse_order),
            group: row.node("effort_uri").cloned(),
            uri,
        })
    }
}

fn parse_order(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|f| f as i64))
}

/// Order options for display.
///
/// If any option carries `order`, the whole set is stably sorted ascending,
/// with unordered options after the ordered ones. Otherwise arrival order stands.
pub fn sort_options(options: &mut [SlotOption]) {
    if options.iter().any(|o| o.order.is_some()) {
        options.sort_by_key(|o| (o.order.is_none(), o.order.unwrap_or(0)));
    }
}

/// Convert rows to options, dropping rows without an `instance_uri` node.
pub fn options_from_rows(rows: &[Row]) -> Vec<SlotOption> {
    let options: Vec<SlotOption> = rows.iter().filter_map(SlotOption::from_row).collect();
    if options.len() < rows.len() {
        tracing::debug!(
            dropped = rows.len() - options.len(),
            "rows without instance_uri skipped"
        );
    }
    options
}

/// Distinct effort buckets from format rows, keyed by (effort, order).
pub fn effort_options(format_rows: &[Row]) -> Vec<SlotOption> {
    let mut efforts: Vec<SlotOption> = Vec::new();
    for row in format_rows {
        let Some(uri) = row.node("effort_uri") else {
            continue;
        };
        let order = row.value("order").and_then(parse_order);
        if efforts.iter().any(|e| &e.uri == uri && e.order == order) {
            continue;
        }
        let label = row
            .value("effort")
            .map(str::to_string)
            .unwrap_or_else(|| uri.local_name().to_string());
        efforts.push(SlotOption {
            label,
            uri: uri.clone(),
            description: None,
            order,
            group: None,
        });
    }
    sort_options(&mut efforts);
    efforts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Term;

    fn node(local: &str) -> GraphNode {
        GraphNode::parse(format!("urn:protege:ontology:progreval#{local}")).unwrap()
    }

    fn opt(label: &str, order: Option<i64>) -> SlotOption {
        let o = SlotOption::new(label, node(label));
        match order {
            Some(n) => o.with_order(n),
            None => o,
        }
    }

    fn labels(options: &[SlotOption]) -> Vec<&str> {
        options.iter().map(|o| o.label.as_str()).collect()
    }

    #[test]
    fn sort_is_ascending_and_stable() {
        let mut options = vec![
            opt("c", Some(2)),
            opt("a", Some(1)),
            opt("d", Some(2)),
            opt("b", Some(1)),
        ];
        sort_options(&mut options);
        assert_eq!(labels(&options), vec!["a", "b", "c", "d"]);
        assert!(options.windows(2).all(|w| w[0].order <= w[1].order));
    }

    #[test]
    fn unordered_set_keeps_arrival_order() {
        let mut options = vec![opt("z", None), opt("a", None), opt("m", None)];
        sort_options(&mut options);
        assert_eq!(labels(&options), vec!["z", "a", "m"]);
    }

    #[test]
    fn partially_ordered_set_puts_unordered_last() {
        let mut options = vec![opt("x", None), opt("b", Some(3)), opt("a", Some(1))];
        sort_options(&mut options);
        assert_eq!(labels(&options), vec!["a", "b", "x"]);
    }

    #[test]
    fn from_row_reads_normalized_keys() {
        let row = Row::new()
            .with("?Label", Term::literal("Variables"))
            .with("?Instance_URI", Term::Node(node("Variables")))
            .with("?Order", Term::literal("2"));
        let o = SlotOption::from_row(&row).unwrap();
        assert_eq!(o.label, "Variables");
        assert_eq!(o.order, Some(2));
        assert!(o.description.is_none());
    }

    #[test]
    fn row_without_node_is_skipped() {
        let rows = vec![Row::new().with("label", Term::literal("orphan"))];
        assert!(options_from_rows(&rows).is_empty());
    }

    #[test]
    fn effort_buckets_are_distinct_and_sorted() {
        let format = |f: &str, effort: &str, order: &str| {
            Row::new()
                .with("instance_uri", Term::Node(node(f)))
                .with("label", Term::literal(f))
                .with("effort", Term::literal(effort))
                .with("effort_uri", Term::Node(node(effort)))
                .with("order", Term::literal(order))
        };
        let rows = vec![
            format("Ensayo", "Alto", "3"),
            format("MultipleOpcion", "Bajo", "1"),
            format("Codigo", "Alto", "3"),
            Row::new()
                .with("instance_uri", Term::Node(node("SinEsfuerzo")))
                .with("label", Term::literal("SinEsfuerzo")),
        ];
        let efforts = effort_options(&rows);
        assert_eq!(labels(&efforts), vec!["Bajo", "Alto"]);
    }
}
