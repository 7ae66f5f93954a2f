//! Client-side hiring board with optimistic stage transitions.
//!
//! Every move is applied locally before the server hears about it, then either kept or undone
//! once the round-trip settles. Local state lives behind a mutex that is only held for the
//! synchronous halves of an operation, never across the gateway call.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::board::{Pipeline, PipelineIntegrityError};
use super::domain::{
    ApplicantCard, ApplicantId, JobFilter, JobSummary, Stage, StageId, TenantContext,
};
use super::gateway::{GatewayError, PipelineGateway};
use crate::config::PipelineConfig;

/// Result of a move request. Moves never fail outward; the caller only observes state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The server accepted the new stage; the optimistic state stands.
    Confirmed,
    /// The round-trip failed and the board was restored.
    RolledBack { reason: GatewayError },
    /// The applicant already sits in the target stage.
    Unchanged,
    /// No stage holds this applicant (stale id).
    NotFound,
    /// The target is not a column on the current board.
    UnknownStage,
    /// A move for this applicant is still in flight.
    InFlight,
}

/// Why a board load did not replace the current state.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not fetch pipeline: {0}")]
    Gateway(#[from] GatewayError),
    #[error("server returned an inconsistent pipeline: {0}")]
    Invalid(#[from] PipelineIntegrityError),
    #[error("a newer load was requested before this one returned")]
    Superseded,
}

/// Optimistic move applied locally and awaiting the server's answer.
#[derive(Debug)]
pub struct PendingMove {
    applicant_id: ApplicantId,
    from: StageId,
    to: StageId,
    original_index: usize,
    original_card: ApplicantCard,
    snapshot: Pipeline,
    revision: u64,
    epoch: u64,
}

impl PendingMove {
    pub fn applicant_id(&self) -> &ApplicantId {
        &self.applicant_id
    }

    pub fn origin(&self) -> &StageId {
        &self.from
    }

    pub fn target(&self) -> &StageId {
        &self.to
    }
}

/// Result of the synchronous first half of a move.
#[derive(Debug)]
pub enum BeginMove {
    Started(PendingMove),
    Skipped(MoveOutcome),
}

#[derive(Debug, Default)]
struct BoardState {
    pipeline: Pipeline,
    stages: Vec<Stage>,
    jobs: Vec<JobSummary>,
    filter: JobFilter,
    updating: HashSet<ApplicantId>,
    /// Bumped by every committed change to `pipeline`.
    revision: u64,
    /// Bumped by every successful load.
    epoch: u64,
    /// Ticket of the most recently requested load.
    load_seq: u64,
}

/// Holds one tenant's stage→applicants board and moves applicants between stages.
pub struct PipelineStageModel<G> {
    gateway: Arc<G>,
    config: PipelineConfig,
    state: Mutex<BoardState>,
}

impl<G> PipelineStageModel<G>
where
    G: PipelineGateway + 'static,
{
    pub fn new(gateway: Arc<G>, config: PipelineConfig) -> Self {
        Self {
            gateway,
            config,
            state: Mutex::new(BoardState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the board wholesale. On any failure the current state is left as it was.
    ///
    /// Only the most recently requested load commits; an older one that returns late gets
    /// [`LoadError::Superseded`].
    pub async fn load(&self, ctx: &TenantContext, filter: JobFilter) -> Result<(), LoadError> {
        let ticket = {
            let mut state = self.state();
            state.load_seq += 1;
            state.load_seq
        };

        let fetched = timeout(
            self.config.request_timeout,
            self.gateway.fetch_pipeline(ctx, &filter),
        )
        .await
        .unwrap_or(Err(GatewayError::Timeout));

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(tenant = %ctx.tenant_id().0, error = %err, "pipeline load failed");
                return Err(err.into());
            }
        };

        let pipeline = snapshot.pipeline.aligned_to(&snapshot.stages)?;
        pipeline.validate()?;

        let mut state = self.state();
        if state.load_seq != ticket {
            debug!(
                tenant = %ctx.tenant_id().0,
                job = filter.as_query().unwrap_or("all"),
                "stale pipeline load discarded"
            );
            return Err(LoadError::Superseded);
        }
        info!(
            tenant = %ctx.tenant_id().0,
            job = filter.as_query().unwrap_or("all"),
            applicants = pipeline.len(),
            stages = snapshot.stages.len(),
            "pipeline loaded"
        );
        state.pipeline = pipeline;
        state.stages = snapshot.stages;
        state.jobs = snapshot.jobs;
        state.filter = filter;
        state.revision += 1;
        state.epoch += 1;
        Ok(())
    }

    /// Move an applicant to `target`, optimistically, then confirm or roll back.
    pub async fn move_applicant(
        &self,
        ctx: &TenantContext,
        applicant_id: &ApplicantId,
        target: &StageId,
    ) -> MoveOutcome {
        let pending = match self.begin_move(applicant_id, target) {
            BeginMove::Started(pending) => pending,
            BeginMove::Skipped(outcome) => return outcome,
        };

        let guard = SettleGuard {
            model: self,
            pending: Some(pending),
        };

        let result = timeout(
            self.config.request_timeout,
            self.gateway.update_status(ctx, applicant_id, target),
        )
        .await
        .unwrap_or(Err(GatewayError::Timeout));

        guard.settle(result)
    }

    /// Button-triggered move; same routine as a drag.
    pub async fn quick_action(
        &self,
        ctx: &TenantContext,
        applicant_id: &ApplicantId,
        target: &StageId,
    ) -> MoveOutcome {
        self.move_applicant(ctx, applicant_id, target).await
    }

    /// Apply a move locally and flag the applicant as updating.
    pub fn begin_move(&self, applicant_id: &ApplicantId, target: &StageId) -> BeginMove {
        let mut state = self.state();

        if state.updating.contains(applicant_id) {
            debug!(applicant = %applicant_id, "move ignored; previous move still in flight");
            return BeginMove::Skipped(MoveOutcome::InFlight);
        }

        let Some(placement) = state.pipeline.locate(applicant_id) else {
            debug!(applicant = %applicant_id, "move ignored; applicant not on the board");
            return BeginMove::Skipped(MoveOutcome::NotFound);
        };

        if &placement.stage == target {
            return BeginMove::Skipped(MoveOutcome::Unchanged);
        }

        if !state.pipeline.has_stage(target) {
            debug!(applicant = %applicant_id, stage = %target, "move ignored; unknown stage");
            return BeginMove::Skipped(MoveOutcome::UnknownStage);
        }

        let snapshot = state.pipeline.clone();
        let Some(original_card) = snapshot.find(applicant_id).cloned() else {
            return BeginMove::Skipped(MoveOutcome::NotFound);
        };
        if state.pipeline.relocate(applicant_id, target).is_none() {
            return BeginMove::Skipped(MoveOutcome::NotFound);
        }

        state.revision += 1;
        state.updating.insert(applicant_id.clone());

        BeginMove::Started(PendingMove {
            applicant_id: applicant_id.clone(),
            from: placement.stage,
            to: target.clone(),
            original_index: placement.index,
            original_card,
            snapshot,
            revision: state.revision,
            epoch: state.epoch,
        })
    }

    /// Keep the optimistic state and release the applicant.
    ///
    /// A load that landed while the move was in flight may carry the pre-move position. The
    /// server has accepted the move, so it is re-applied on top of the loaded board.
    pub fn confirm(&self, pending: PendingMove) -> MoveOutcome {
        let mut state = self.state();
        state.updating.remove(&pending.applicant_id);

        if state.epoch != pending.epoch {
            let stale = state
                .pipeline
                .locate(&pending.applicant_id)
                .is_some_and(|placement| placement.stage == pending.from);
            if stale
                && state
                    .pipeline
                    .relocate(&pending.applicant_id, &pending.to)
                    .is_some()
            {
                state.revision += 1;
                debug!(
                    applicant = %pending.applicant_id,
                    to = %pending.to,
                    "confirmed move re-applied over reloaded board"
                );
            }
        }
        debug!(
            applicant = %pending.applicant_id,
            from = %pending.from,
            to = %pending.to,
            "stage change confirmed"
        );
        MoveOutcome::Confirmed
    }

    /// Undo an optimistic move and release the applicant.
    ///
    /// With no intervening change the pre-move board is restored wholesale. A load that landed
    /// in between is authoritative and is kept. Another move that landed in between is kept too;
    /// only this applicant is put back at its original position.
    pub fn roll_back(&self, pending: PendingMove, reason: GatewayError) -> MoveOutcome {
        let mut state = self.state();
        state.updating.remove(&pending.applicant_id);

        warn!(
            applicant = %pending.applicant_id,
            from = %pending.from,
            to = %pending.to,
            error = %reason,
            "stage change failed; rolling back"
        );

        if state.epoch != pending.epoch {
            debug!(applicant = %pending.applicant_id, "board reloaded meanwhile; keeping loaded state");
        } else if state.revision == pending.revision {
            state.pipeline = pending.snapshot;
            state.revision += 1;
        } else {
            let PendingMove {
                applicant_id,
                from,
                original_index,
                original_card,
                ..
            } = pending;
            state.pipeline.remove(&applicant_id);
            if state
                .pipeline
                .insert_at(&from, original_index, original_card)
                .is_err()
            {
                warn!(applicant = %applicant_id, stage = %from, "original stage vanished; card dropped from board");
            }
            state.revision += 1;
        }

        MoveOutcome::RolledBack { reason }
    }

    /// Copy of the current stage mapping.
    pub fn pipeline(&self) -> Pipeline {
        self.state().pipeline.clone()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.state().stages.clone()
    }

    pub fn jobs(&self) -> Vec<JobSummary> {
        self.state().jobs.clone()
    }

    pub fn filter(&self) -> JobFilter {
        self.state().filter.clone()
    }

    pub fn is_updating(&self, applicant_id: &ApplicantId) -> bool {
        self.state().updating.contains(applicant_id)
    }

    pub fn updating(&self) -> HashSet<ApplicantId> {
        self.state().updating.clone()
    }

    /// Text-filtered rendering of the board. The stored mapping is not touched.
    pub fn view(&self, query: &str) -> Pipeline {
        self.state().pipeline.filtered(query)
    }
}

/// Rolls the move back if the future is dropped before the round-trip settles.
struct SettleGuard<'a, G>
where
    G: PipelineGateway + 'static,
{
    model: &'a PipelineStageModel<G>,
    pending: Option<PendingMove>,
}

impl<G> SettleGuard<'_, G>
where
    G: PipelineGateway + 'static,
{
    fn settle(mut self, result: Result<(), GatewayError>) -> MoveOutcome {
        let Some(pending) = self.pending.take() else {
            return MoveOutcome::Unchanged;
        };
        match result {
            Ok(()) => self.model.confirm(pending),
            Err(reason) => self.model.roll_back(pending, reason),
        }
    }
}

impl<G> Drop for SettleGuard<'_, G>
where
    G: PipelineGateway + 'static,
{
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.model.roll_back(pending, GatewayError::Cancelled);
        }
    }
}
