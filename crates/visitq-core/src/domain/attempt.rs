//! Proxy attempt ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::AttemptGroupId;

/// One proxy try reported by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAttempt {
    pub attempt: u32,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl ProxyAttempt {
    pub fn new(attempt: u32, ip: Option<&str>, city: Option<&str>) -> Self {
        Self {
            attempt,
            ip: ip.map(str::to_string),
            city: city.map(str::to_string),
        }
    }
}

/// Persisted attempt row, keyed by `(group, attempt)`.
///
/// Every row written for one resolution shares the same `group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAttemptLog {
    pub group: AttemptGroupId,
    pub attempt: u32,
    pub ip: Option<String>,
    pub city: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProxyAttemptLog {
    pub fn from_attempt(group: AttemptGroupId, attempt: &ProxyAttempt, timestamp: DateTime<Utc>) -> Self {
        Self {
            group,
            attempt: attempt.attempt,
            ip: attempt.ip.clone(),
            city: attempt.city.clone(),
            timestamp,
        }
    }
}
