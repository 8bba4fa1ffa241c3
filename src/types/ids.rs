//! Newtype wrappers for group-stage identifiers.
//!
//! These keep team, group, stage and tournament identifiers from being mixed
//! up (e.g. passing a `GroupId` where a `TeamId` is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_id!(
    /// A registered team.
    TeamId
);

string_id!(
    /// A group within a group stage.
    GroupId
);

string_id!(
    /// A group stage (the aggregate a snapshot describes).
    GroupStageId
);

string_id!(
    /// The tournament a group stage belongs to.
    TournamentId
);

/// Position of a slot within its group. Stable for the life of the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(pub u32);

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SlotIndex {
    fn from(n: u32) -> Self {
        SlotIndex(n)
    }
}

/// Server-issued version marker for optimistic concurrency.
///
/// Opaque: only ever compared for equality, never parsed or ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(pub String);

impl VersionToken {
    pub fn new(s: impl Into<String>) -> Self {
        VersionToken(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        VersionToken(s.to_string())
    }
}
