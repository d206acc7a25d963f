//! Relation trust engine
//!
//! Maintains the undirected "these two tracks are similar" graph and the
//! trust/doubt tally of each edge. Every mutation is one transaction that
//! claims the relation row before reading it, so concurrent votes on the same
//! relation serialize instead of overwriting each other's deltas. Nothing is
//! cached between calls.

pub mod error;
pub mod retry;
pub mod transition;
pub mod types;
pub mod weight;

pub use error::EngineError;
pub use types::{CreateOutcome, FlagOutcome, FlagReason, RelatedTrack, VoteDirection, VoteOutcome};
pub use weight::{UnitWeight, VoteWeightPolicy};

use raesonic_common::db::{
    get_setting_u64, tracks_exist, Relation, RelationId, TrackId, UserId,
    DEFAULT_VOTE_MAX_LOCK_WAIT_MS, VOTE_MAX_LOCK_WAIT_KEY,
};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::{flags, relations, votes};
use retry::retry_on_lock;
use transition::{LedgerAction, Tally};

/// Upper bound on edges returned for one track
pub const MAX_LISTED_RELATIONS: i64 = 100;

pub struct TrustEngine {
    pool: SqlitePool,
    weight: Arc<dyn VoteWeightPolicy>,
    max_lock_wait_ms: u64,
}

impl TrustEngine {
    /// Engine with unit vote weight and the default lock wait budget
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            weight: Arc::new(UnitWeight),
            max_lock_wait_ms: DEFAULT_VOTE_MAX_LOCK_WAIT_MS,
        }
    }

    /// Engine configured from the settings table
    pub async fn from_settings(pool: SqlitePool) -> Result<Self, EngineError> {
        let max_lock_wait_ms = get_setting_u64(&pool, VOTE_MAX_LOCK_WAIT_KEY)
            .await?
            .unwrap_or(DEFAULT_VOTE_MAX_LOCK_WAIT_MS);

        Ok(Self::new(pool).with_max_lock_wait_ms(max_lock_wait_ms))
    }

    pub fn with_weight_policy(mut self, policy: Arc<dyn VoteWeightPolicy>) -> Self {
        self.weight = policy;
        self
    }

    pub fn with_max_lock_wait_ms(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn weight_of(&self, caller: UserId) -> i64 {
        i64::from(self.weight.weight(caller).get())
    }

    /// Relate two tracks, or upvote the relation if it already exists
    pub async fn create_relation(
        &self,
        first: TrackId,
        second: TrackId,
        caller: Option<UserId>,
    ) -> Result<CreateOutcome, EngineError> {
        let caller = caller.ok_or(EngineError::Unauthenticated)?;
        validate_pair(first, second)?;
        if first == second {
            return Err(EngineError::SelfRelation);
        }

        if !tracks_exist(&self.pool, first, second).await? {
            return Err(EngineError::TrackNotFound);
        }

        let weight = self.weight_of(caller);
        let outcome = retry_on_lock("create_relation", self.max_lock_wait_ms, || {
            self.create_relation_tx(first, second, caller, weight)
        })
        .await?;

        match outcome {
            CreateOutcome::Created { relation_id } => info!(
                relation_id = relation_id.0,
                track_id = first.0,
                linked_id = second.0,
                user_id = caller.0,
                "Relation created"
            ),
            CreateOutcome::AlreadyExists { relation_id, vote } => debug!(
                relation_id = relation_id.0,
                user_id = caller.0,
                score = vote.score,
                "Relation already existed, upvoted"
            ),
        }

        Ok(outcome)
    }

    async fn create_relation_tx(
        &self,
        first: TrackId,
        second: TrackId,
        caller: UserId,
        weight: i64,
    ) -> raesonic_common::Result<CreateOutcome> {
        let mut tx = self.pool.begin().await?;
        let now = now();

        let inserted = relations::insert_relation(&mut tx, first, second, weight, now).await?;
        if let Some(relation_id) = inserted {
            votes::insert_vote(&mut tx, relation_id, caller, weight, now).await?;
            tx.commit().await?;
            return Ok(CreateOutcome::Created { relation_id });
        }

        // The pair exists: same transaction, same lock, becomes an upvote
        let relation = relations::claim_relation_by_pair(&mut tx, first, second)
            .await?
            .ok_or_else(|| {
                raesonic_common::Error::Internal(format!(
                    "relation {}-{} conflicted on insert but was not found",
                    first, second
                ))
            })?;
        let relation_id = relation.relation_id;
        let vote = apply_vote(&mut tx, &relation, caller, weight, now).await?;
        tx.commit().await?;

        Ok(CreateOutcome::AlreadyExists { relation_id, vote })
    }

    /// Up to [`MAX_LISTED_RELATIONS`] edges touching `track_id`
    ///
    /// A point-in-time read; it may miss a vote committed concurrently.
    pub async fn track_relations(
        &self,
        track_id: TrackId,
        caller: Option<UserId>,
    ) -> Result<Vec<RelatedTrack>, EngineError> {
        let related =
            relations::list_track_relations(&self.pool, track_id, caller, MAX_LISTED_RELATIONS)
                .await?;
        Ok(related)
    }

    /// Set, change or clear the caller's vote on an existing relation
    ///
    /// Repeating the same request converges to the same tally, so internal
    /// failures can be retried by the caller.
    pub async fn set_vote(
        &self,
        first: TrackId,
        second: TrackId,
        caller: Option<UserId>,
        requested: i64,
    ) -> Result<VoteOutcome, EngineError> {
        let caller = caller.ok_or(EngineError::Unauthenticated)?;
        let direction = VoteDirection::try_from(requested)?;
        validate_pair(first, second)?;

        let value = direction.sign() * self.weight_of(caller);
        let outcome = retry_on_lock("set_vote", self.max_lock_wait_ms, || {
            self.set_vote_tx(first, second, caller, value)
        })
        .await?
        .ok_or(EngineError::RelationNotFound)?;

        debug!(
            track_id = first.0,
            linked_id = second.0,
            user_id = caller.0,
            score = outcome.score,
            applied = outcome.applied,
            "Vote set"
        );

        Ok(outcome)
    }

    async fn set_vote_tx(
        &self,
        first: TrackId,
        second: TrackId,
        caller: UserId,
        value: i64,
    ) -> raesonic_common::Result<Option<VoteOutcome>> {
        let mut tx = self.pool.begin().await?;

        let Some(relation) = relations::claim_relation_by_pair(&mut tx, first, second).await? else {
            return Ok(None);
        };

        let outcome = apply_vote(&mut tx, &relation, caller, value, now()).await?;
        tx.commit().await?;

        Ok(Some(outcome))
    }

    /// Relation id for an unordered track pair
    pub async fn find_relation_id(
        &self,
        first: TrackId,
        second: TrackId,
    ) -> Result<RelationId, EngineError> {
        relations::find_relation_id(&self.pool, first, second)
            .await?
            .ok_or(EngineError::RelationNotFound)
    }

    /// Current state of a relation
    pub async fn relation(&self, relation_id: RelationId) -> Result<Option<Relation>, EngineError> {
        Ok(relations::get_relation(&self.pool, relation_id).await?)
    }

    /// The user's live vote on a relation, if any
    pub async fn vote_of(
        &self,
        relation_id: RelationId,
        user_id: UserId,
    ) -> Result<Option<i64>, EngineError> {
        Ok(votes::find_vote(&self.pool, relation_id, user_id)
            .await?
            .map(|vote| vote.value))
    }

    /// Does the user hold an unresolved flag on the relation?
    pub async fn has_unresolved_flag(
        &self,
        relation_id: RelationId,
        user_id: UserId,
    ) -> Result<bool, EngineError> {
        Ok(flags::has_unresolved_flag(&self.pool, relation_id, user_id).await?)
    }

    /// Flag the relation between two tracks for moderation
    pub async fn flag_relation(
        &self,
        first: TrackId,
        second: TrackId,
        caller: Option<UserId>,
        reason_id: i64,
    ) -> Result<FlagOutcome, EngineError> {
        let caller = caller.ok_or(EngineError::Unauthenticated)?;
        let reason = FlagReason::try_from(reason_id)?;
        validate_pair(first, second)?;

        let relation_id = self.find_relation_id(first, second).await?;

        let outcome = retry_on_lock("flag_relation", self.max_lock_wait_ms, || async {
            let mut tx = self.pool.begin().await?;
            let outcome = flags::set_flag(&mut tx, relation_id, caller, reason, now()).await?;
            tx.commit().await?;
            Ok::<_, raesonic_common::Error>(outcome)
        })
        .await?;

        debug!(
            relation_id = relation_id.0,
            user_id = caller.0,
            reason_id,
            ?outcome,
            "Relation flag set"
        );

        Ok(outcome)
    }

    /// Recompute drifted tallies from the vote ledger
    ///
    /// Returns the number of relations corrected. Runs as one transaction; a
    /// vote committed meanwhile makes it retry from fresh state.
    pub async fn reconcile(&self) -> Result<usize, EngineError> {
        let corrected = retry_on_lock("reconcile", self.max_lock_wait_ms, || async {
            let mut tx = self.pool.begin().await?;
            let drifted = relations::find_drifted(&mut tx).await?;
            let now = now();

            for drift in &drifted {
                warn!(
                    relation_id = drift.relation_id.0,
                    trust = drift.trust,
                    doubt = drift.doubt,
                    ledger_trust = drift.ledger_trust,
                    ledger_doubt = drift.ledger_doubt,
                    "Relation tally drifted from vote ledger, correcting"
                );
                relations::store_tally(
                    &mut tx,
                    drift.relation_id,
                    Tally::new(drift.ledger_trust, drift.ledger_doubt),
                    now,
                )
                .await?;
            }

            tx.commit().await?;
            Ok::<_, raesonic_common::Error>(drifted.len())
        })
        .await?;

        info!(corrected, "Relation tally reconciliation finished");
        Ok(corrected)
    }
}

/// Apply the caller's vote `value` (0 clears) to a claimed relation
///
/// Tally and ledger are written in the caller's transaction; the tally is
/// written once with both the reversal and the new contribution folded in.
async fn apply_vote(
    conn: &mut SqliteConnection,
    relation: &Relation,
    caller: UserId,
    value: i64,
    now: i64,
) -> raesonic_common::Result<VoteOutcome> {
    let relation_id = relation.relation_id;
    let current = votes::find_vote(&mut *conn, relation_id, caller).await?;
    let plan = transition::plan(current.map(|vote| vote.value), value);

    let tally = Tally::from(relation).apply(plan.delta).ok_or_else(|| {
        raesonic_common::Error::Internal(format!(
            "tally of relation {} would go negative; reconcile required",
            relation_id
        ))
    })?;

    match plan.ledger {
        LedgerAction::Keep => {}
        LedgerAction::Insert(v) => {
            votes::insert_vote(&mut *conn, relation_id, caller, v, now).await?
        }
        LedgerAction::Update(v) => {
            votes::update_vote(&mut *conn, relation_id, caller, v, now).await?
        }
        LedgerAction::Delete => votes::delete_vote(&mut *conn, relation_id, caller).await?,
    }

    if !plan.delta.is_zero() {
        relations::store_tally(&mut *conn, relation_id, tally, now).await?;
    }

    Ok(VoteOutcome {
        score: tally.score(),
        applied: plan.applied,
    })
}

fn validate_pair(first: TrackId, second: TrackId) -> Result<(), EngineError> {
    if first.is_valid() && second.is_valid() {
        Ok(())
    } else {
        Err(EngineError::InvalidTrackId)
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
