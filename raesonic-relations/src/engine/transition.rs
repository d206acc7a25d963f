//! Vote transition planning
//!
//! Pure arithmetic over a relation's tally and one caller's vote. The store
//! layer reads the current state, asks for a [`Transition`], and applies the
//! resulting tally and ledger change in the same transaction.

use raesonic_common::db::Relation;

/// Aggregate counters of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub trust: i64,
    pub doubt: i64,
}

impl Tally {
    pub fn new(trust: i64, doubt: i64) -> Self {
        Self { trust, doubt }
    }

    pub fn score(&self) -> i64 {
        self.trust - self.doubt
    }

    /// Apply a delta; `None` if either counter would go negative
    ///
    /// A negative result means the tally had drifted from the vote ledger.
    pub fn apply(self, delta: TallyDelta) -> Option<Tally> {
        let trust = self.trust.checked_add(delta.trust)?;
        let doubt = self.doubt.checked_add(delta.doubt)?;
        if trust < 0 || doubt < 0 {
            return None;
        }
        Some(Tally { trust, doubt })
    }
}

impl From<&Relation> for Tally {
    fn from(relation: &Relation) -> Self {
        Tally::new(relation.trust, relation.doubt)
    }
}

/// Signed change to both counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TallyDelta {
    pub trust: i64,
    pub doubt: i64,
}

impl TallyDelta {
    /// What a live vote of `value` adds to the tally
    ///
    /// Positive votes count toward trust, negative ones add their magnitude
    /// to doubt.
    pub fn contribution(value: i64) -> Self {
        match value {
            v if v > 0 => TallyDelta { trust: v, doubt: 0 },
            v if v < 0 => TallyDelta { trust: 0, doubt: -v },
            _ => TallyDelta::default(),
        }
    }

    /// Removes the contribution of a vote of `value`
    pub fn reversal(value: i64) -> Self {
        let c = Self::contribution(value);
        TallyDelta {
            trust: -c.trust,
            doubt: -c.doubt,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.trust == 0 && self.doubt == 0
    }
}

impl std::ops::Add for TallyDelta {
    type Output = TallyDelta;

    fn add(self, rhs: TallyDelta) -> TallyDelta {
        TallyDelta {
            trust: self.trust + rhs.trust,
            doubt: self.doubt + rhs.doubt,
        }
    }
}

/// Change to the caller's row in the vote ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Keep,
    Insert(i64),
    Update(i64),
    Delete,
}

/// Everything one vote call changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Folded delta; old contribution reversed and new one applied together
    pub delta: TallyDelta,
    pub ledger: LedgerAction,
    /// Value reported back to the caller (0 after a clear)
    pub applied: i64,
}

/// Plan the transition from the caller's `current` vote to `requested`
///
/// `requested` is already weighted; 0 means "clear".
pub fn plan(current: Option<i64>, requested: i64) -> Transition {
    match (current, requested) {
        (None, 0) => Transition {
            delta: TallyDelta::default(),
            ledger: LedgerAction::Keep,
            applied: 0,
        },
        (Some(old), 0) => Transition {
            delta: TallyDelta::reversal(old),
            ledger: LedgerAction::Delete,
            applied: 0,
        },
        (None, new) => Transition {
            delta: TallyDelta::contribution(new),
            ledger: LedgerAction::Insert(new),
            applied: new,
        },
        (Some(old), new) if old == new => Transition {
            delta: TallyDelta::default(),
            ledger: LedgerAction::Keep,
            applied: new,
        },
        (Some(old), new) => Transition {
            delta: TallyDelta::reversal(old) + TallyDelta::contribution(new),
            ledger: LedgerAction::Update(new),
            applied: new,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_vote_adds_contribution() {
        let up = plan(None, 1);
        assert_eq!(up.delta, TallyDelta { trust: 1, doubt: 0 });
        assert_eq!(up.ledger, LedgerAction::Insert(1));

        let down = plan(None, -3);
        assert_eq!(down.delta, TallyDelta { trust: 0, doubt: 3 });
        assert_eq!(down.applied, -3);
    }

    #[test]
    fn test_repeated_vote_is_noop() {
        let t = plan(Some(1), 1);
        assert!(t.delta.is_zero());
        assert_eq!(t.ledger, LedgerAction::Keep);
        assert_eq!(t.applied, 1);
    }

    #[test]
    fn test_sign_flip_folds_both_adjustments() {
        let t = plan(Some(1), -1);
        assert_eq!(t.delta, TallyDelta { trust: -1, doubt: 1 });
        assert_eq!(t.ledger, LedgerAction::Update(-1));

        let after = Tally::new(2, 0).apply(t.delta).unwrap();
        assert_eq!(after, Tally::new(1, 1));
        assert_eq!(after.score(), 0);
    }

    #[test]
    fn test_clear_reverses_negative_vote() {
        let t = plan(Some(-2), 0);
        assert_eq!(t.delta, TallyDelta { trust: 0, doubt: -2 });
        assert_eq!(t.ledger, LedgerAction::Delete);
        assert_eq!(Tally::new(0, 2).apply(t.delta), Some(Tally::new(0, 0)));
    }

    #[test]
    fn test_clear_without_vote_keeps_ledger() {
        let t = plan(None, 0);
        assert!(t.delta.is_zero());
        assert_eq!(t.ledger, LedgerAction::Keep);
        assert_eq!(t.applied, 0);
    }

    #[test]
    fn test_vote_then_clear_nets_to_zero() {
        let start = Tally::new(4, 2);
        let voted = start.apply(plan(None, 1).delta).unwrap();
        let cleared = voted.apply(plan(Some(1), 0).delta).unwrap();
        assert_eq!(cleared, start);
    }

    #[test]
    fn test_drifted_tally_is_detected() {
        // Tally lost the vote it is now asked to reverse
        assert_eq!(Tally::new(0, 0).apply(plan(Some(1), 0).delta), None);
    }
}
