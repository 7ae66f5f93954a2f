use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::domain::{ApplicantCard, ApplicantId, JobSummary, Stage, StageId};

/// Stage columns in funnel order, each holding its cards newest-first.
///
/// Serialized as a JSON object keyed by stage id; key order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    columns: Vec<StageColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageColumn {
    pub stage: StageId,
    pub applicants: Vec<ApplicantCard>,
}

/// Where a card currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub stage: StageId,
    pub index: usize,
}

/// Payload of a board fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub pipeline: Pipeline,
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
}

/// Structural problems that make a fetched board unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineIntegrityError {
    #[error("applicant {applicant_id} listed under both '{first}' and '{second}'")]
    DuplicateApplicant {
        applicant_id: ApplicantId,
        first: StageId,
        second: StageId,
    },
    #[error("applicant {applicant_id} listed under '{listed}' but carries status '{status}'")]
    StatusMismatch {
        applicant_id: ApplicantId,
        listed: StageId,
        status: StageId,
    },
    #[error("pipeline column '{0}' does not match any configured stage")]
    UnknownStage(StageId),
}

impl Pipeline {
    /// Empty board with one column per stage.
    pub fn new(stages: &[Stage]) -> Self {
        Self {
            columns: stages
                .iter()
                .map(|stage| StageColumn {
                    stage: stage.id.clone(),
                    applicants: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn from_columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (StageId, Vec<ApplicantCard>)>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(stage, applicants)| StageColumn { stage, applicants })
                .collect(),
        }
    }

    pub fn columns(&self) -> &[StageColumn] {
        &self.columns
    }

    pub fn stage_ids(&self) -> impl Iterator<Item = &StageId> {
        self.columns.iter().map(|column| &column.stage)
    }

    pub fn has_stage(&self, stage: &StageId) -> bool {
        self.columns.iter().any(|column| &column.stage == stage)
    }

    pub fn column(&self, stage: &StageId) -> Option<&[ApplicantCard]> {
        self.columns
            .iter()
            .find(|column| &column.stage == stage)
            .map(|column| column.applicants.as_slice())
    }

    fn column_mut(&mut self, stage: &StageId) -> Option<&mut Vec<ApplicantCard>> {
        self.columns
            .iter_mut()
            .find(|column| &column.stage == stage)
            .map(|column| &mut column.applicants)
    }

    /// Total number of cards across every column.
    pub fn len(&self) -> usize {
        self.columns.iter().map(|column| column.applicants.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|column| column.applicants.is_empty())
    }

    /// Linear scan over every column.
    pub fn locate(&self, applicant_id: &ApplicantId) -> Option<Placement> {
        self.columns.iter().find_map(|column| {
            column
                .applicants
                .iter()
                .position(|card| &card.id == applicant_id)
                .map(|index| Placement {
                    stage: column.stage.clone(),
                    index,
                })
        })
    }

    pub fn find(&self, applicant_id: &ApplicantId) -> Option<&ApplicantCard> {
        self.columns
            .iter()
            .flat_map(|column| column.applicants.iter())
            .find(|card| &card.id == applicant_id)
    }

    pub(crate) fn remove(&mut self, applicant_id: &ApplicantId) -> Option<(Placement, ApplicantCard)> {
        let placement = self.locate(applicant_id)?;
        let column = self.column_mut(&placement.stage)?;
        let card = column.remove(placement.index);
        Some((placement, card))
    }

    /// Insert at `index`, clamped to the column length. Returns the card back if the stage is absent.
    pub(crate) fn insert_at(
        &mut self,
        stage: &StageId,
        index: usize,
        card: ApplicantCard,
    ) -> Result<(), ApplicantCard> {
        match self.column_mut(stage) {
            Some(column) => {
                let index = index.min(column.len());
                column.insert(index, card);
                Ok(())
            }
            None => Err(card),
        }
    }

    /// Pull a card out of its column and prepend it to `target` with its status rewritten.
    /// Leaves the board untouched when the card or the target column is missing.
    pub(crate) fn relocate(
        &mut self,
        applicant_id: &ApplicantId,
        target: &StageId,
    ) -> Option<Placement> {
        if !self.has_stage(target) {
            return None;
        }

        let (from, mut card) = self.remove(applicant_id)?;
        card.status = target.clone();
        if let Err(card) = self.insert_at(target, 0, card) {
            // target was checked above; put the card back where it came from
            let _ = self.insert_at(&from.stage, from.index, card);
            return None;
        }
        Some(from)
    }

    /// Rebuild the columns in `stages` order; stages without a column get an empty one.
    pub fn aligned_to(self, stages: &[Stage]) -> Result<Self, PipelineIntegrityError> {
        let mut by_stage: HashMap<StageId, Vec<ApplicantCard>> = HashMap::new();
        for column in self.columns {
            if !stages.iter().any(|stage| stage.id == column.stage) {
                return Err(PipelineIntegrityError::UnknownStage(column.stage));
            }
            by_stage
                .entry(column.stage)
                .or_default()
                .extend(column.applicants);
        }

        Ok(Self::from_columns(stages.iter().map(|stage| {
            let applicants = by_stage.remove(&stage.id).unwrap_or_default();
            (stage.id.clone(), applicants)
        })))
    }

    /// Check single residency and that every card's status names the column it sits in.
    pub fn validate(&self) -> Result<(), PipelineIntegrityError> {
        let mut seen: HashMap<&ApplicantId, &StageId> = HashMap::new();
        for column in &self.columns {
            for card in &column.applicants {
                if card.status != column.stage {
                    return Err(PipelineIntegrityError::StatusMismatch {
                        applicant_id: card.id.clone(),
                        listed: column.stage.clone(),
                        status: card.status.clone(),
                    });
                }
                if let Some(first) = seen.insert(&card.id, &column.stage) {
                    return Err(PipelineIntegrityError::DuplicateApplicant {
                        applicant_id: card.id.clone(),
                        first: first.clone(),
                        second: column.stage.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render-time text filter; produces a separate board and never touches `self`.
    pub fn filtered(&self, query: &str) -> Self {
        let needle = query.trim().to_lowercase();
        Self {
            columns: self
                .columns
                .iter()
                .map(|column| StageColumn {
                    stage: column.stage.clone(),
                    applicants: column
                        .applicants
                        .iter()
                        .filter(|card| card.matches(&needle))
                        .cloned()
                        .collect(),
                })
                .collect(),
        }
    }
}

impl Serialize for Pipeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(&column.stage, &column.applicants)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Pipeline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PipelineVisitor;

        impl<'de> Visitor<'de> for PipelineVisitor {
            type Value = Pipeline;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of stage ids to applicant lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Pipeline, A::Error> {
                let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((stage, applicants)) =
                    access.next_entry::<StageId, Vec<ApplicantCard>>()?
                {
                    columns.push(StageColumn { stage, applicants });
                }
                Ok(Pipeline { columns })
            }
        }

        deserializer.deserialize_map(PipelineVisitor)
    }
}
