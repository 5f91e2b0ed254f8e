//! Prerequisite skill matrix.
//!
//! Rows are performances, columns are concepts. A cell holds the skill node
//! `s` with `s empleaDesempeño performance` and `s empleaDesempeñoSobre
//! concept`, or nothing. Empty cells are disabled: they can never be checked
//! and never make a skill forbidden.

use crate::error::OntologyResult;
use crate::graph::vocab::{self, EMPLOYS_PERFORMANCE, EMPLOYS_PERFORMANCE_OVER};
use crate::graph::{GraphNode, GraphStore};

use super::SlotOption;
use super::filter::ForbiddenSkillSet;

/// Concept × performance table of prerequisite skills.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillMatrix {
    concepts: Vec<SlotOption>,
    performances: Vec<SlotOption>,
    /// Row-major: `performance * concepts.len() + concept`.
    cells: Vec<Option<GraphNode>>,
}

impl SkillMatrix {
    pub fn concepts(&self) -> &[SlotOption] {
        &self.concepts
    }

    pub fn performances(&self) -> &[SlotOption] {
        &self.performances
    }

    /// Skill at (performance row, concept column).
    pub fn cell(&self, performance: usize, concept: usize) -> Option<&GraphNode> {
        if performance >= self.performances.len() || concept >= self.concepts.len() {
            return None;
        }
        self.cells[performance * self.concepts.len() + concept].as_ref()
    }

    /// Skill for a (concept, performance) node pair.
    pub fn skill_for(&self, concept: &GraphNode, performance: &GraphNode) -> Option<&GraphNode> {
        let c = self.concepts.iter().position(|o| &o.uri == concept)?;
        let p = self.performances.iter().position(|o| &o.uri == performance)?;
        self.cell(p, c)
    }

    /// Populated cells in row-major order.
    pub fn skills(&self) -> impl Iterator<Item = &GraphNode> {
        self.cells.iter().flatten()
    }

    pub fn populated(&self) -> usize {
        self.skills().count()
    }

    /// True when either axis is empty; there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty() || self.performances.is_empty()
    }
}

/// Builds the [`SkillMatrix`] from direct triple matches.
pub struct SkillMatrixResolver;

impl SkillMatrixResolver {
    /// Resolve every (concept, performance) cell.
    ///
    /// When several skills qualify, the first in the store's match order wins.
    pub fn resolve<S: GraphStore + ?Sized>(
        store: &S,
        concepts: &[SlotOption],
        performances: &[SlotOption],
    ) -> OntologyResult<SkillMatrix> {
        let employs = vocab::progreval(EMPLOYS_PERFORMANCE);
        let employs_over = vocab::progreval(EMPLOYS_PERFORMANCE_OVER);

        let mut cells = Vec::with_capacity(concepts.len() * performances.len());
        for performance in performances {
            let candidates: Vec<GraphNode> = store
                .statements_matching(None, &employs, Some(&performance.uri))?
                .into_iter()
                .filter_map(|st| st.subject.as_node().cloned())
                .collect();

            for concept in concepts {
                let mut skill = None;
                for candidate in &candidates {
                    let over = store.statements_matching(
                        Some(candidate),
                        &employs_over,
                        Some(&concept.uri),
                    )?;
                    if !over.is_empty() {
                        skill = Some(candidate.clone());
                        break;
                    }
                }
                cells.push(skill);
            }
        }

        let matrix = SkillMatrix {
            concepts: concepts.to_vec(),
            performances: performances.to_vec(),
            cells,
        };
        tracing::debug!(
            concepts = concepts.len(),
            performances = performances.len(),
            populated = matrix.populated(),
            "skill matrix resolved"
        );
        Ok(matrix)
    }
}

/// Which prerequisite skills the learners are marked as having.
///
/// Every populated cell starts unchecked, i.e. forbidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillChecklist {
    columns: usize,
    skills: Vec<Option<GraphNode>>,
    checked: Vec<bool>,
}

impl SkillChecklist {
    pub fn new(matrix: &SkillMatrix) -> Self {
        Self {
            columns: matrix.concepts.len(),
            skills: matrix.cells.clone(),
            checked: vec![false; matrix.cells.len()],
        }
    }

    fn index(&self, performance: usize, concept: usize) -> Option<usize> {
        if concept >= self.columns {
            return None;
        }
        let idx = performance
            .checked_mul(self.columns)?
            .checked_add(concept)?;
        (idx < self.skills.len()).then_some(idx)
    }

    pub fn is_enabled(&self, performance: usize, concept: usize) -> bool {
        self.index(performance, concept)
            .is_some_and(|i| self.skills[i].is_some())
    }

    pub fn is_checked(&self, performance: usize, concept: usize) -> bool {
        self.index(performance, concept).is_some_and(|i| self.checked[i])
    }

    /// Returns `false` for disabled or out-of-range cells.
    pub fn set_cell(&mut self, performance: usize, concept: usize, possessed: bool) -> bool {
        match self.index(performance, concept) {
            Some(i) if self.skills[i].is_some() => {
                self.checked[i] = possessed;
                true
            }
            _ => false,
        }
    }

    pub fn toggle(&mut self, performance: usize, concept: usize) -> bool {
        let current = self.is_checked(performance, concept);
        self.set_cell(performance, concept, !current)
    }

    /// Select-all over every enabled cell.
    pub fn set_all(&mut self, possessed: bool) {
        for (checked, skill) in self.checked.iter_mut().zip(&self.skills) {
            if skill.is_some() {
                *checked = possessed;
            }
        }
    }

    /// Select-all over one concept column.
    pub fn set_column(&mut self, concept: usize, possessed: bool) {
        if concept >= self.columns {
            return;
        }
        for i in (concept..self.skills.len()).step_by(self.columns) {
            if self.skills[i].is_some() {
                self.checked[i] = possessed;
            }
        }
    }

    /// Column header state: every enabled cell in the column is checked.
    pub fn column_checked(&self, concept: usize) -> bool {
        if concept >= self.columns {
            return false;
        }
        let mut enabled = (concept..self.skills.len())
            .step_by(self.columns)
            .filter(|&i| self.skills[i].is_some())
            .peekable();
        enabled.peek().is_some() && enabled.all(|i| self.checked[i])
    }

    /// Mark every cell holding `skill`. Returns how many cells changed.
    pub fn set_skill(&mut self, skill: &GraphNode, possessed: bool) -> usize {
        let mut hits = 0;
        for (checked, cell) in self.checked.iter_mut().zip(&self.skills) {
            if cell.as_ref() == Some(skill) {
                *checked = possessed;
                hits += 1;
            }
        }
        hits
    }

    /// Skills of enabled, unchecked cells.
    pub fn forbidden(&self) -> ForbiddenSkillSet {
        self.skills
            .iter()
            .zip(&self.checked)
            .filter_map(|(skill, checked)| match skill {
                Some(skill) if !checked => Some(skill.clone()),
                _ => None,
            })
            .collect()
    }
}
