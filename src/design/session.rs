//! Cascading selection controller for one design session.
//!
//! Owns the explicit session state and drives the presentation collaborator
//! through [`DesignView`]. Independent slots (concept, performance, audience,
//! formats) load concurrently and nothing is rendered until all of them have
//! settled. Dependent slots follow their upstream:
//!
//! - concept -> competency level: re-fetched per concept, latest fetch wins
//! - effort -> format: filtered locally from the format rows
//!
//! Submitting captures a [`Submission`] snapshot synchronously before any
//! query runs, so later selection changes cannot leak into it.

use crate::error::{QueryError, QueryResult, SessionError, SessionResult};
use crate::graph::ready::ReadyListener;
use crate::graph::{GraphNode, GraphStore, QueryOutput};
use crate::query::{GraphQueryClient, SubstitutionMap, TemplateCatalog, TemplateKind};

use super::filter::{CandidateResult, DisplayRecord, ForbiddenSkillSet, PrerequisiteFilter};
use super::matrix::{SkillChecklist, SkillMatrix, SkillMatrixResolver};
use super::slots::{FetchTicket, ParameterSlot, SlotState};
use super::validity::ValidityTracker;
use super::{SlotId, SlotOption, effort_options, options_from_rows};

/// Default number of example exercises returned per submission.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Placeholder shown in a slot that has no options to offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPrompt {
    Loading,
    /// Pick the upstream slot first.
    AwaitingUpstream(SlotId),
    Failed(String),
}

/// Presentation collaborator.
pub trait DesignView {
    /// A slot entered (or re-entered) `Populated`.
    fn slot_populated(&mut self, slot: SlotId, options: &[SlotOption]);

    fn slot_prompt(&mut self, slot: SlotId, prompt: SlotPrompt);

    /// The prerequisite grid is ready to render.
    fn matrix_ready(&mut self, _matrix: &SkillMatrix) {}

    /// Filtered, capped, display-ready rows of a completed submission.
    fn results(&mut self, rows: &[DisplayRecord]);

    fn results_failed(&mut self, _error: &QueryError) {}

    fn validity(&mut self, can_submit: bool);
}

/// All mutable session state; nothing lives outside it.
#[derive(Debug, Clone)]
pub struct SessionState {
    slots: Vec<ParameterSlot>,
    formats: Vec<SlotOption>,
    matrix: SkillMatrix,
    checklist: SkillChecklist,
    initialized: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            slots: SlotId::ALL.iter().map(|id| ParameterSlot::new(*id)).collect(),
            formats: Vec::new(),
            matrix: SkillMatrix::default(),
            checklist: SkillChecklist::default(),
            initialized: false,
        }
    }

    pub fn slot(&self, id: SlotId) -> &ParameterSlot {
        &self.slots[id as usize]
    }

    fn slot_mut(&mut self, id: SlotId) -> &mut ParameterSlot {
        &mut self.slots[id as usize]
    }

    pub fn selection(&self, id: SlotId) -> Option<&GraphNode> {
        self.slot(id).selection()
    }

    pub fn matrix(&self) -> &SkillMatrix {
        &self.matrix
    }

    pub fn checklist(&self) -> &SkillChecklist {
        &self.checklist
    }

    /// Every activity format, across all effort buckets.
    pub fn formats(&self) -> &[SlotOption] {
        &self.formats
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn can_submit(&self) -> bool {
        ValidityTracker::can_submit(|s| self.slot(s).is_filled())
    }

    fn substitutions(&self) -> SubstitutionMap {
        let mut map = SubstitutionMap::new();
        for id in SlotId::ALL {
            if let (Some(token), Some(node)) = (id.placeholder(), self.selection(id)) {
                map.insert_node(token, node);
            }
        }
        map
    }
}

/// Everything a submission needs, captured at the moment of submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub substitutions: SubstitutionMap,
    pub forbidden: ForbiddenSkillSet,
    pub max_results: usize,
}

impl Submission {
    /// Query, attach prerequisites, filter, cap, strip.
    pub async fn run<S: GraphStore>(
        &self,
        client: &GraphQueryClient<S>,
        catalog: &TemplateCatalog,
    ) -> QueryResult<Vec<DisplayRecord>> {
        let QueryOutput { variables, rows } = client
            .execute(catalog.get(TemplateKind::Activity), &self.substitutions)
            .await?;
        let matched = rows.len();

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let mut candidate = CandidateResult::from_row(row);
            candidate.attach_required_skills(client.store())?;
            candidates.push(candidate);
        }

        let kept = PrerequisiteFilter::new(&self.forbidden).select_top(candidates, self.max_results);
        tracing::info!(
            matched,
            forbidden = self.forbidden.len(),
            returned = kept.len(),
            "submission complete"
        );
        Ok(kept
            .into_iter()
            .map(|c| c.into_display(&variables))
            .collect())
    }
}

/// The cascading selection controller.
pub struct DesignSession<S, V> {
    client: GraphQueryClient<S>,
    catalog: TemplateCatalog,
    view: V,
    state: SessionState,
    max_results: usize,
}

impl<S: GraphStore, V: DesignView> DesignSession<S, V> {
    pub fn new(client: GraphQueryClient<S>, catalog: TemplateCatalog, view: V) -> Self {
        Self {
            client,
            catalog,
            view,
            state: SessionState::new(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn client(&self) -> &GraphQueryClient<S> {
        &self.client
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Wait for the ontology, then initialize.
    pub async fn start(&mut self, ready: &mut ReadyListener) -> SessionResult<()> {
        if !ready.is_ready() {
            tracing::info!("waiting for ontology before initializing session");
        }
        ready.wait().await?;
        self.initialize().await
    }

    /// Load all independent slots concurrently and build the skill matrix.
    ///
    /// Fails only when the ontology is not loaded; a single slot failing is
    /// reported through the view and leaves its siblings intact.
    pub async fn initialize(&mut self) -> SessionResult<()> {
        if !self.client.store().is_loaded() {
            return Err(QueryError::NotReady.into());
        }

        let client = &self.client;
        let catalog = &self.catalog;
        let none = SubstitutionMap::new();
        let (concepts, performances, audiences, formats) = tokio::join!(
            client.execute(catalog.get(TemplateKind::Concept), &none),
            client.execute(catalog.get(TemplateKind::Performance), &none),
            client.execute(catalog.get(TemplateKind::Audience), &none),
            client.execute(catalog.get(TemplateKind::Format), &none),
        );

        // All settled; render from here on.
        for (slot, result) in [
            (SlotId::Concept, concepts),
            (SlotId::Performance, performances),
            (SlotId::Audience, audiences),
        ] {
            match result {
                Ok(output) => {
                    let options = options_from_rows(&output.rows);
                    self.state.slot_mut(slot).populate(options);
                    self.view
                        .slot_populated(slot, self.state.slot(slot).options());
                }
                Err(e) => self.fail_slot(slot, &e),
            }
        }

        match formats {
            Ok(output) => {
                self.state.formats = options_from_rows(&output.rows);
                self.state
                    .slot_mut(SlotId::Effort)
                    .populate(effort_options(&output.rows));
                self.view.slot_populated(
                    SlotId::Effort,
                    self.state.slot(SlotId::Effort).options(),
                );
            }
            Err(e) => {
                self.state.formats.clear();
                self.fail_slot(SlotId::Effort, &e);
            }
        }

        self.state.slot_mut(SlotId::Format).reset();
        self.view
            .slot_prompt(SlotId::Format, SlotPrompt::AwaitingUpstream(SlotId::Effort));
        self.state.slot_mut(SlotId::Competency).reset();
        self.view.slot_prompt(
            SlotId::Competency,
            SlotPrompt::AwaitingUpstream(SlotId::Concept),
        );

        self.rebuild_matrix();
        self.state.initialized = true;
        tracing::info!(
            concepts = self.state.slot(SlotId::Concept).options().len(),
            performances = self.state.slot(SlotId::Performance).options().len(),
            audiences = self.state.slot(SlotId::Audience).options().len(),
            formats = self.state.formats.len(),
            skills = self.state.matrix.populated(),
            "design session initialized"
        );
        self.emit_validity();
        Ok(())
    }

    fn rebuild_matrix(&mut self) {
        let concepts = self.state.slot(SlotId::Concept).options();
        let performances = self.state.slot(SlotId::Performance).options();
        let matrix = match SkillMatrixResolver::resolve(self.client.store(), concepts, performances) {
            Ok(matrix) => matrix,
            Err(e) => {
                tracing::warn!(error = %e, "skill matrix unavailable");
                SkillMatrix::default()
            }
        };
        self.state.checklist = SkillChecklist::new(&matrix);
        self.state.matrix = matrix;
        self.view.matrix_ready(&self.state.matrix);
    }

    fn fail_slot(&mut self, slot: SlotId, error: &QueryError) {
        tracing::warn!(%slot, error = %error, "slot fetch failed");
        self.state.slot_mut(slot).fail(error.to_string());
        self.view
            .slot_prompt(slot, SlotPrompt::Failed(error.to_string()));
    }

    fn ensure_initialized(&self) -> SessionResult<()> {
        if self.state.initialized {
            Ok(())
        } else {
            Err(SessionError::Uninitialized)
        }
    }

    fn emit_validity(&mut self) {
        let can_submit = self.state.can_submit();
        self.view.validity(can_submit);
    }

    /// Change any slot's selection, cascading to dependents.
    pub async fn select(&mut self, slot: SlotId, value: Option<GraphNode>) -> SessionResult<()> {
        match slot {
            SlotId::Concept => self.select_concept(value).await,
            SlotId::Effort => self.select_effort(value),
            _ => {
                self.ensure_initialized()?;
                self.state.slot_mut(slot).select(value)?;
                self.emit_validity();
                Ok(())
            }
        }
    }

    /// Select a concept and refresh its competency levels.
    pub async fn select_concept(&mut self, value: Option<GraphNode>) -> SessionResult<()> {
        if let Some(ticket) = self.set_concept(value)? {
            let result = self.fetch(&ticket).await;
            self.complete_fetch(&ticket, result);
        }
        Ok(())
    }

    /// Synchronous half of a concept change.
    ///
    /// Returns the competency fetch to run, or `None` when the concept was
    /// cleared and the competency slot went back to `Unselected`.
    pub fn set_concept(&mut self, value: Option<GraphNode>) -> SessionResult<Option<FetchTicket>> {
        self.ensure_initialized()?;
        self.state.slot_mut(SlotId::Concept).select(value)?;

        let ticket = match self.state.selection(SlotId::Concept).cloned() {
            None => {
                self.state.slot_mut(SlotId::Competency).reset();
                self.view.slot_prompt(
                    SlotId::Competency,
                    SlotPrompt::AwaitingUpstream(SlotId::Concept),
                );
                None
            }
            Some(concept) => {
                let substitutions =
                    SubstitutionMap::new().bind_node(crate::query::catalog::CONCEPT_URI, &concept);
                let ticket = self
                    .state
                    .slot_mut(SlotId::Competency)
                    .begin_fetch(substitutions);
                tracing::debug!(concept = %concept, seq = ticket.seq, "competency fetch issued");
                self.view
                    .slot_prompt(SlotId::Competency, SlotPrompt::Loading);
                Some(ticket)
            }
        };
        self.emit_validity();
        Ok(ticket)
    }

    /// Run the query for an issued ticket. Does not touch session state.
    pub async fn fetch(&self, ticket: &FetchTicket) -> QueryResult<Vec<SlotOption>> {
        let kind = match ticket.slot {
            SlotId::Competency => TemplateKind::Competency,
            SlotId::Concept => TemplateKind::Concept,
            SlotId::Performance => TemplateKind::Performance,
            SlotId::Audience => TemplateKind::Audience,
            SlotId::Effort | SlotId::Format => TemplateKind::Format,
        };
        let output = self
            .client
            .execute(self.catalog.get(kind), &ticket.substitutions)
            .await?;
        Ok(options_from_rows(&output.rows))
    }

    /// Apply a fetch result if `ticket` is still the latest for its slot.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: QueryResult<Vec<SlotOption>>,
    ) -> bool {
        let failure = result.as_ref().err().map(ToString::to_string);
        if !self.state.slot_mut(ticket.slot).complete(ticket, result) {
            tracing::debug!(slot = %ticket.slot, seq = ticket.seq, "discarding stale fetch");
            return false;
        }
        match failure {
            None => self
                .view
                .slot_populated(ticket.slot, self.state.slot(ticket.slot).options()),
            Some(message) => {
                tracing::warn!(slot = %ticket.slot, error = %message, "slot fetch failed");
                self.view.slot_prompt(ticket.slot, SlotPrompt::Failed(message));
            }
        }
        self.emit_validity();
        true
    }

    /// Select an effort bucket and show its formats.
    pub fn select_effort(&mut self, value: Option<GraphNode>) -> SessionResult<()> {
        self.ensure_initialized()?;
        self.state.slot_mut(SlotId::Effort).select(value)?;

        match self.state.selection(SlotId::Effort).cloned() {
            None => {
                self.state.slot_mut(SlotId::Format).reset();
                self.view
                    .slot_prompt(SlotId::Format, SlotPrompt::AwaitingUpstream(SlotId::Effort));
            }
            Some(effort) => {
                let formats: Vec<SlotOption> = self
                    .state
                    .formats
                    .iter()
                    .filter(|f| f.group.as_ref() == Some(&effort))
                    .cloned()
                    .collect();
                self.state.slot_mut(SlotId::Format).populate(formats);
                self.view
                    .slot_populated(SlotId::Format, self.state.slot(SlotId::Format).options());
            }
        }
        self.emit_validity();
        Ok(())
    }

    /// Description of the selected competency level for the selected concept.
    pub fn competency_description(&self) -> Option<&str> {
        self.state
            .slot(SlotId::Competency)
            .selected_option()?
            .description
            .as_deref()
    }

    /// Mutable access to the prerequisite checklist.
    pub fn checklist_mut(&mut self) -> &mut SkillChecklist {
        &mut self.state.checklist
    }

    /// Snapshot the current selections and forbidden skills.
    pub fn prepare_submission(&self) -> SessionResult<Submission> {
        self.ensure_initialized()?;
        let missing = ValidityTracker::missing(|s| self.state.slot(s).is_filled());
        if !missing.is_empty() {
            return Err(SessionError::Incomplete {
                missing: missing
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        Ok(Submission {
            substitutions: self.state.substitutions(),
            forbidden: self.state.checklist.forbidden(),
            max_results: self.max_results,
        })
    }

    /// Snapshot, run and hand the rows to the view.
    pub async fn submit(&mut self) -> SessionResult<Vec<DisplayRecord>> {
        let submission = self.prepare_submission()?;
        match submission.run(&self.client, &self.catalog).await {
            Ok(rows) => {
                self.view.results(&rows);
                Ok(rows)
            }
            Err(e) => {
                tracing::warn!(error = %e, "submission failed");
                self.view.results_failed(&e);
                Err(e.into())
            }
        }
    }

    pub fn slot_state(&self, slot: SlotId) -> &SlotState {
        self.state.slot(slot).state()
    }
}
