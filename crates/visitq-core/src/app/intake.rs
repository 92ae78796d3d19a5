//! Intake - turns an incoming chat message into a queue item.
//!
//! # Flow
//! 1. Look the sender up; unknown owners are ignored.
//! 2. Extract link candidates. Zero or several candidates append a
//!    `no_link` / `many_links` event and stop.
//! 3. Plan the scheduled time from the owner's transition mode.
//! 4. Enqueue the single link as a pending item.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::app::planner::TransitionTimePlanner;
use crate::domain::{
    DirectoryError, Event, EventOutcome, MessageRef, OwnerId, QueueItem, QueueItemId, StoreError,
    TransitionMode,
};
use crate::ports::{Clock, EventLog, IdGenerator, OwnerDirectory, QueueStore};

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|t\.me/\S+|@\w+").expect("hardcoded regex"));

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Queued(QueueItem),
    /// `NoLink` or `ManyLinks`; the event is already appended.
    Rejected(EventOutcome),
    /// Sender has no directory entry.
    Ignored,
}

impl Submission {
    /// Short reply for the submitting chat, if any.
    pub fn acknowledgement(&self) -> Option<&'static str> {
        match self {
            Submission::Queued(_) => Some("Link added to the queue."),
            Submission::Rejected(EventOutcome::ManyLinks) => Some("Send one link at a time."),
            Submission::Rejected(_) => Some("No link found in the message."),
            Submission::Ignored => None,
        }
    }
}

/// Every link candidate in `text`, in order of appearance.
pub fn extract_links(text: &str) -> Vec<&str> {
    LINK_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

#[derive(Clone)]
pub struct Intake {
    store: Arc<dyn QueueStore>,
    events: Arc<dyn EventLog>,
    directory: Arc<dyn OwnerDirectory>,
    planner: TransitionTimePlanner,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Intake {
    pub fn new(
        store: Arc<dyn QueueStore>,
        events: Arc<dyn EventLog>,
        directory: Arc<dyn OwnerDirectory>,
        planner: TransitionTimePlanner,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            events,
            directory,
            planner,
            ids,
            clock,
        }
    }

    pub async fn submit(
        &self,
        owner: OwnerId,
        message_ref: MessageRef,
        text: &str,
    ) -> Result<Submission, IntakeError> {
        let Some(profile) = self.directory.lookup(owner).await? else {
            tracing::debug!(%owner, "submission from unknown owner ignored");
            return Ok(Submission::Ignored);
        };

        let now = self.clock.now();
        let url = match extract_links(text).as_slice() {
            [url] => url.to_string(),
            [] => return self.reject(owner, EventOutcome::NoLink).await,
            _ => return self.reject(owner, EventOutcome::ManyLinks).await,
        };

        let scheduled_time = self.plan(now, profile.transition_mode);
        let item = self.store.enqueue(owner, &url, message_ref, scheduled_time).await?;
        tracing::info!(
            item = %item.id,
            %owner,
            scheduled = ?item.scheduled_time,
            "link queued"
        );
        Ok(Submission::Queued(item))
    }

    /// The owner's open items.
    pub async fn pending(&self, owner: OwnerId) -> Result<Vec<QueueItem>, IntakeError> {
        Ok(self.store.list(owner).await?)
    }

    /// Remove a pending item on the owner's request.
    pub async fn withdraw(&self, owner: OwnerId, id: QueueItemId) -> Result<(), IntakeError> {
        self.store.delete(owner, id).await?;
        tracing::info!(item = %id, %owner, "item withdrawn");
        Ok(())
    }

    fn plan(&self, now: DateTime<Utc>, mode: TransitionMode) -> Option<DateTime<Utc>> {
        let mut rng = rand::thread_rng();
        self.planner.compute(now, mode, &mut rng)
    }

    async fn reject(&self, owner: OwnerId, outcome: EventOutcome) -> Result<Submission, IntakeError> {
        let event = Event::bare(self.ids.generate_event_id(), owner, outcome, self.clock.now());
        self.events.append(event).await?;
        tracing::debug!(%owner, %outcome, "submission rejected");
        Ok(Submission::Rejected(outcome))
    }
}
