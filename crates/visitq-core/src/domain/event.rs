//! Outcome records.
//!
//! An `Event` is appended once per submission-time rejection and once per
//! resolved queue item. Events are never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AttemptGroupId, EventId, OwnerId};

/// Classification of an event.
///
/// `NoLink` and `ManyLinks` are produced at submission time and never become
/// queue items. The remaining three are the terminal outcomes of a
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    NoLink,
    ManyLinks,
    ProxyError,
    RedirectorError,
    Success,
}

impl EventOutcome {
    /// Is this one of the terminal outcomes of a resolution?
    pub fn is_resolution(self) -> bool {
        matches!(
            self,
            EventOutcome::ProxyError | EventOutcome::RedirectorError | EventOutcome::Success
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventOutcome::NoLink => "no_link",
            EventOutcome::ManyLinks => "many_links",
            EventOutcome::ProxyError => "proxy_error",
            EventOutcome::RedirectorError => "redirector_error",
            EventOutcome::Success => "success",
        }
    }
}

impl std::fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable outcome record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub owner: OwnerId,
    pub device_id: Option<u32>,
    pub outcome: EventOutcome,
    pub attempt_group: Option<AttemptGroupId>,
    pub initial_url: Option<String>,
    pub final_url: Option<String>,
    pub ip: Option<String>,
    pub isp: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// A record with no provenance, e.g. a rejected submission.
    pub fn bare(id: EventId, owner: OwnerId, outcome: EventOutcome, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            device_id: None,
            outcome,
            attempt_group: None,
            initial_url: None,
            final_url: None,
            ip: None,
            isp: None,
            timestamp,
        }
    }
}
