//! Vote weight policies
//!
//! A vote's magnitude comes from a policy rather than from the caller, so a
//! reputation-based scheme can replace [`UnitWeight`] without touching the
//! transition logic.

use raesonic_common::db::UserId;
use std::num::NonZeroU32;

/// Magnitude a caller's vote contributes to a relation
pub trait VoteWeightPolicy: Send + Sync {
    fn weight(&self, caller: UserId) -> NonZeroU32;
}

/// Every vote counts once
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitWeight;

impl VoteWeightPolicy for UnitWeight {
    fn weight(&self, _caller: UserId) -> NonZeroU32 {
        NonZeroU32::MIN
    }
}

impl<F> VoteWeightPolicy for F
where
    F: Fn(UserId) -> NonZeroU32 + Send + Sync,
{
    fn weight(&self, caller: UserId) -> NonZeroU32 {
        self(caller)
    }
}
