//! Deadline sort order for the task list.

use serde::{Deserialize, Serialize};

/// Order in which the task list is sorted by deadline.
///
/// Tasks without a deadline sort as the smallest value: first when
/// ascending, last when descending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Earliest deadline first.
    #[default]
    Ascending,
    /// Latest deadline first.
    Descending,
}

impl SortOrder {
    /// The opposite order.
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Whether this is [`SortOrder::Ascending`].
    pub fn is_ascending(self) -> bool {
        self == Self::Ascending
    }

    /// SQL keyword for an `ORDER BY` clause.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl From<bool> for SortOrder {
    fn from(ascending: bool) -> Self {
        if ascending {
            Self::Ascending
        } else {
            Self::Descending
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ascending => write!(f, "ascending"),
            Self::Descending => write!(f, "descending"),
        }
    }
}
