//! Owner view exposed by the external user directory.

use serde::{Deserialize, Serialize};

use super::ids::OwnerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

/// When the owner hears about resolved links.
///
/// - `Each`: one message per resolved item, replying to the submission.
/// - `Summary`: one message listing every successful visit, sent when the
///   owner's queue drains.
/// - `None`: silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    #[default]
    Each,
    Summary,
    None,
}

/// How a new submission is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    #[default]
    Immediate,
    Daily,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub role: Role,
    #[serde(default)]
    pub notify_mode: NotifyMode,
    #[serde(default)]
    pub transition_mode: TransitionMode,
}
