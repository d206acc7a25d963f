//! Database models

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Ids handed out by the stores are strictly positive
            pub fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(
    /// Identity of a track in the Track Identity Store
    TrackId
);
id_newtype!(
    /// Identity of an authenticated user
    UserId
);
id_newtype!(
    /// Identity of a relation edge
    RelationId
);

/// Undirected similarity edge between two tracks with its vote aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Relation {
    pub relation_id: RelationId,
    pub track_id: TrackId,
    pub linked_id: TrackId,
    /// Sum of positive vote weights currently applied
    pub trust: i64,
    /// Sum of absolute negative vote weights currently applied
    pub doubt: i64,
}

impl Relation {
    /// Displayed score; may be negative
    pub fn score(&self) -> i64 {
        self.trust - self.doubt
    }
}

/// One user's live, nonzero vote on a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RelationVote {
    pub vote_id: i64,
    pub relation_id: RelationId,
    pub user_id: UserId,
    pub value: i64,
}
