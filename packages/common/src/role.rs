#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller role supplied by the authentication layer.
///
/// The judging service trusts this value as-is; issuing and verifying the
/// tokens that carry it is someone else's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform developer.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DEV"))]
    Dev,
    /// Staff member who authors and reviews problems.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "STAFF"))]
    Staff,
    /// Regular member solving published problems.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "MEMBER"))]
    Member,
}

impl Role {
    pub const ALL: &'static [Role] = &[Self::Dev, Self::Staff, Self::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "DEV",
            Self::Staff => "STAFF",
            Self::Member => "MEMBER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid role '{}'. Valid values: DEV, STAFF, MEMBER", self.invalid)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEV" => Ok(Self::Dev),
            "STAFF" => Ok(Self::Staff),
            "MEMBER" => Ok(Self::Member),
            _ => Err(ParseRoleError {
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
        for role in Role::ALL {
            let json = serde_json::to_string(role).unwrap();
            let parsed: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(*role, parsed);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("STAFF".parse::<Role>().unwrap(), Role::Staff);
        assert!("staff".parse::<Role>().is_err());
    }
}
