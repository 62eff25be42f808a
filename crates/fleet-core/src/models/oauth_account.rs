//! Linkage between an application user and an identity-provider account.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FleetError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Line,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "line" => Ok(Self::Line),
            other => Err(FleetError::Validation {
                message: format!("unsupported provider: {other}"),
            }),
        }
    }
}

/// Provider tokens cached on the linkage.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CachedTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuthAccount {
    pub id: Uuid,
    pub app_user_id: Uuid,
    pub provider: Provider,
    /// Subject id assigned by the provider; unique per provider.
    pub provider_user_id: String,
    pub email: Option<String>,
    pub tokens: CachedTokens,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Linkage fields supplied at creation. The owning user is passed
/// separately so the same value can be used when the user is created in
/// the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOAuthAccount {
    pub provider: Provider,
    pub provider_user_id: String,
    pub email: Option<String>,
    pub tokens: CachedTokens,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_its_tag() {
        for p in [Provider::Google, Provider::Line] {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
        assert!("github".parse::<Provider>().is_err());
    }
}
