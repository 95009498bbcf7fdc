#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff-facing lifecycle state of a problem.
///
/// The lifecycle forms a small state machine:
///
/// ```text
/// IN_PROGRESS -> NEED_REVIEW -> PUBLISHED -> ARCHIVED
///                NEED_REVIEW -> REJECTED  -> IN_PROGRESS
/// ```
///
/// `IN_PROGRESS` is the initial state and `ARCHIVED` is terminal. Moving from
/// `REJECTED` back to `IN_PROGRESS` (reopening) clears the rejection message.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in
/// SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DevStatus {
    /// Being authored; not yet handed over for review.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "IN_PROGRESS"))]
    InProgress,
    /// Waiting for a reviewer's decision.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "NEED_REVIEW"))]
    NeedReview,
    /// Visible to members and open for submissions.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PUBLISHED"))]
    Published,
    /// Sent back by a reviewer; carries a rejection message.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REJECTED"))]
    Rejected,
    /// Retired. No further transitions.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ARCHIVED"))]
    Archived,
}

impl DevStatus {
    /// Returns true if the lifecycle permits moving from `self` to `next`.
    pub fn can_become(self, next: DevStatus) -> bool {
        matches!(
            (self, next),
            (Self::InProgress, Self::NeedReview)
                | (Self::NeedReview, Self::Published)
                | (Self::NeedReview, Self::Rejected)
                | (Self::Published, Self::Archived)
                | (Self::Rejected, Self::InProgress)
        )
    }

    /// Returns true if no transition can ever leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    /// All lifecycle states.
    pub const ALL: &'static [DevStatus] = &[
        Self::InProgress,
        Self::NeedReview,
        Self::Published,
        Self::Rejected,
        Self::Archived,
    ];

    /// Returns the string representation (SCREAMING_SNAKE_CASE).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::NeedReview => "NEED_REVIEW",
            Self::Published => "PUBLISHED",
            Self::Rejected => "REJECTED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for DevStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for DevStatus {
    fn default() -> Self {
        Self::InProgress
    }
}

/// Error when parsing an invalid lifecycle state string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDevStatusError {
    invalid: String,
}

impl fmt::Display for ParseDevStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid dev status '{}'. Valid values: {}",
            self.invalid,
            DevStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseDevStatusError {}

impl FromStr for DevStatus {
    type Err = ParseDevStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(Self::InProgress),
            "NEED_REVIEW" => Ok(Self::NeedReview),
            "PUBLISHED" => Ok(Self::Published),
            "REJECTED" => Ok(Self::Rejected),
            "ARCHIVED" => Ok(Self::Archived),
            _ => Err(ParseDevStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_roundtrip() {
        for status in DevStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            let parsed: DevStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "PUBLISHED".parse::<DevStatus>().unwrap(),
            DevStatus::Published
        );
        assert!("Published".parse::<DevStatus>().is_err());
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(DevStatus::InProgress.can_become(DevStatus::NeedReview));
        assert!(DevStatus::NeedReview.can_become(DevStatus::Published));
        assert!(DevStatus::Published.can_become(DevStatus::Archived));
    }

    #[test]
    fn test_rejection_loop() {
        assert!(DevStatus::NeedReview.can_become(DevStatus::Rejected));
        assert!(DevStatus::Rejected.can_become(DevStatus::InProgress));
        // A rejected problem cannot be rejected again without going through
        // review first.
        assert!(!DevStatus::Rejected.can_become(DevStatus::Rejected));
        assert!(!DevStatus::Rejected.can_become(DevStatus::Published));
    }

    #[test]
    fn test_archived_is_terminal() {
        assert!(DevStatus::Archived.is_terminal());
        for next in DevStatus::ALL {
            assert!(!DevStatus::Archived.can_become(*next));
        }
    }

    #[test]
    fn test_no_skipping_review() {
        assert!(!DevStatus::InProgress.can_become(DevStatus::Published));
        assert!(!DevStatus::InProgress.can_become(DevStatus::Archived));
    }
}
