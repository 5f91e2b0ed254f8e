//! Parameter slot state machine.
//!
//! `Unselected -> Loading -> Populated | Error`. Every fetch is tagged with a
//! per-slot sequence number; only the most recently issued fetch may
//! complete the slot. Earlier completions are discarded, whatever order
//! they arrive in.

use crate::error::{QueryResult, SessionError, SessionResult};
use crate::graph::GraphNode;
use crate::query::SubstitutionMap;

use super::{SlotId, SlotOption, sort_options};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// Upstream value missing, or not yet initialized.
    Unselected,
    Loading,
    Populated(Vec<SlotOption>),
    Error(String),
}

/// An issued fetch for a dependent slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub slot: SlotId,
    pub seq: u64,
    /// Upstream values captured when the fetch was issued.
    pub substitutions: SubstitutionMap,
}

#[derive(Debug, Clone)]
pub struct ParameterSlot {
    id: SlotId,
    state: SlotState,
    selection: Option<GraphNode>,
    issued: u64,
}

impl ParameterSlot {
    pub fn new(id: SlotId) -> Self {
        Self {
            id,
            state: SlotState::Unselected,
            selection: None,
            issued: 0,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    /// Current options; empty unless populated.
    pub fn options(&self) -> &[SlotOption] {
        match &self.state {
            SlotState::Populated(options) => options,
            _ => &[],
        }
    }

    pub fn selection(&self) -> Option<&GraphNode> {
        self.selection.as_ref()
    }

    pub fn selected_option(&self) -> Option<&SlotOption> {
        let selected = self.selection.as_ref()?;
        self.options().iter().find(|o| &o.uri == selected)
    }

    pub fn is_filled(&self) -> bool {
        self.selection.is_some()
    }

    /// Set or clear the selection. A value must be one of the current options.
    pub fn select(&mut self, value: Option<GraphNode>) -> SessionResult<()> {
        if let Some(v) = &value {
            if !self.options().iter().any(|o| &o.uri == v) {
                return Err(SessionError::UnknownOption {
                    slot: self.id.to_string(),
                    value: v.to_string(),
                });
            }
        }
        self.selection = value;
        Ok(())
    }

    /// Move to `Loading`, clearing options and selection.
    pub fn begin_fetch(&mut self, substitutions: SubstitutionMap) -> FetchTicket {
        self.issued += 1;
        self.state = SlotState::Loading;
        self.selection = None;
        FetchTicket {
            slot: self.id,
            seq: self.issued,
            substitutions,
        }
    }

    /// Replace the option list; the previous selection is dropped.
    pub fn populate(&mut self, mut options: Vec<SlotOption>) {
        sort_options(&mut options);
        self.state = SlotState::Populated(options);
        self.selection = None;
    }

    /// Back to `Unselected`. Any fetch still in flight becomes stale.
    pub fn reset(&mut self) {
        self.issued += 1;
        self.state = SlotState::Unselected;
        self.selection = None;
    }

    /// Enter `Error` directly, invalidating any fetch in flight.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.issued += 1;
        self.state = SlotState::Error(message.into());
        self.selection = None;
    }

    /// Whether `ticket` is the latest fetch issued for this slot.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.slot == self.id && ticket.seq == self.issued && self.state == SlotState::Loading
    }

    /// Apply a fetch result. Returns `false` (and changes nothing) for stale tickets.
    pub fn complete(&mut self, ticket: &FetchTicket, result: QueryResult<Vec<SlotOption>>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match result {
            Ok(options) => self.populate(options),
            Err(e) => {
                self.state = SlotState::Error(e.to_string());
                self.selection = None;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    fn node(local: &str) -> GraphNode {
        GraphNode::parse(format!("urn:protege:ontology:progreval#{local}")).unwrap()
    }

    fn option(local: &str) -> SlotOption {
        SlotOption::new(local, node(local))
    }

    #[test]
    fn latest_fetch_wins() {
        let mut slot = ParameterSlot::new(SlotId::Competency);
        let first = slot.begin_fetch(SubstitutionMap::new());
        let second = slot.begin_fetch(SubstitutionMap::new());

        assert!(slot.complete(&second, Ok(vec![option("Avanzado")])));
        assert!(!slot.complete(&first, Ok(vec![option("Basico")])));
        assert_eq!(slot.options(), &[option("Avanzado")]);
    }

    #[test]
    fn stale_completion_does_not_clobber_loading() {
        let mut slot = ParameterSlot::new(SlotId::Competency);
        let first = slot.begin_fetch(SubstitutionMap::new());
        let _second = slot.begin_fetch(SubstitutionMap::new());
        assert!(!slot.complete(&first, Ok(vec![option("Basico")])));
        assert_eq!(slot.state(), &SlotState::Loading);
    }

    #[test]
    fn reset_invalidates_in_flight_fetch() {
        let mut slot = ParameterSlot::new(SlotId::Competency);
        let ticket = slot.begin_fetch(SubstitutionMap::new());
        slot.reset();
        assert!(!slot.complete(&ticket, Ok(vec![option("Basico")])));
        assert_eq!(slot.state(), &SlotState::Unselected);
    }

    #[test]
    fn failed_fetch_enters_error_state() {
        let mut slot = ParameterSlot::new(SlotId::Competency);
        let ticket = slot.begin_fetch(SubstitutionMap::new());
        assert!(slot.complete(&ticket, Err(QueryError::NotReady)));
        assert!(matches!(slot.state(), SlotState::Error(_)));
        assert!(slot.options().is_empty());
    }

    #[test]
    fn select_requires_listed_option() {
        let mut slot = ParameterSlot::new(SlotId::Audience);
        slot.populate(vec![option("Secundaria")]);
        assert!(slot.select(Some(node("Universidad"))).is_err());
        slot.select(Some(node("Secundaria"))).unwrap();
        assert_eq!(slot.selected_option().unwrap().label, "Secundaria");
        slot.select(None).unwrap();
        assert!(!slot.is_filled());
    }

    #[test]
    fn repopulating_replaces_options_and_clears_selection() {
        let mut slot = ParameterSlot::new(SlotId::Format);
        slot.populate(vec![option("A"), option("B")]);
        slot.select(Some(node("A"))).unwrap();
        slot.populate(vec![option("C")]);
        assert_eq!(slot.options(), &[option("C")]);
        assert!(slot.selection().is_none());
    }
}
