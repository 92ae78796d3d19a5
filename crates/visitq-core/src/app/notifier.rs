//! NotificationDispatcher - tells the owner how their links went.
//!
//! Each message is attempted exactly once. Delivery failures are logged and
//! dropped; the queue's responsibility ends at the dispatch call.
//!
//! Summary mode trusts the open count reported by the outcome commit rather
//! than reading the store again, so one drained queue yields one summary.

use std::sync::Arc;

use crate::domain::{Event, EventOutcome, NotifyMode, QueueItem};
use crate::ports::{EventLog, Messenger, OwnerDirectory};

/// What the dispatcher did for one completed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    /// Summary mode with items still open.
    Deferred,
    /// `NotifyMode::None`.
    Muted,
    UnknownOwner,
    /// A lookup or the delivery itself failed; already logged.
    Failed,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    directory: Arc<dyn OwnerDirectory>,
    events: Arc<dyn EventLog>,
    messenger: Arc<dyn Messenger>,
}

impl NotificationDispatcher {
    pub fn new(
        directory: Arc<dyn OwnerDirectory>,
        events: Arc<dyn EventLog>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            directory,
            events,
            messenger,
        }
    }

    /// `open_after` is the owner's open item count as of the commit.
    pub async fn notify(&self, event: &Event, item: &QueueItem, open_after: usize) -> Dispatch {
        let owner = match self.directory.lookup(item.owner).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                tracing::warn!(owner = %item.owner, item = %item.id, "no directory entry for owner");
                return Dispatch::UnknownOwner;
            }
            Err(error) => {
                tracing::error!(owner = %item.owner, %error, "owner lookup failed");
                return Dispatch::Failed;
            }
        };

        match owner.notify_mode {
            NotifyMode::None => Dispatch::Muted,
            NotifyMode::Each => {
                let text = outcome_message(event, item);
                self.deliver(item, &text, true).await
            }
            NotifyMode::Summary => self.summarize_if_drained(item, open_after).await,
        }
    }

    async fn summarize_if_drained(&self, item: &QueueItem, open_after: usize) -> Dispatch {
        if open_after > 0 {
            tracing::debug!(owner = %item.owner, open = open_after, "summary deferred");
            return Dispatch::Deferred;
        }

        let successes = match self
            .events
            .events_with_outcome(item.owner, EventOutcome::Success)
            .await
        {
            Ok(events) => events,
            Err(error) => {
                tracing::error!(owner = %item.owner, %error, "success history lookup failed");
                return Dispatch::Failed;
            }
        };
        let text = summary_message(&successes);
        self.deliver(item, &text, false).await
    }

    async fn deliver(&self, item: &QueueItem, text: &str, reply: bool) -> Dispatch {
        let reply_to = reply.then_some(item.message_ref);
        match self.messenger.send_message(item.owner, text, reply_to).await {
            Ok(()) => Dispatch::Sent,
            Err(error) => {
                tracing::warn!(item = %item.id, %error, "notification dropped");
                Dispatch::Failed
            }
        }
    }
}

/// Per-item message for `NotifyMode::Each`.
pub fn outcome_message(event: &Event, item: &QueueItem) -> String {
    match (&event.initial_url, &event.final_url) {
        (Some(initial), Some(final_url)) => {
            format!("Visited {initial} → {final_url} ({})", event.outcome)
        }
        _ => format!("Could not visit {} ({})", item.url, event.outcome),
    }
}

/// Lists every successful visit of the owner.
pub fn summary_message(successes: &[Event]) -> String {
    let mut text = String::from("Visit summary:");
    if successes.is_empty() {
        text.push_str("\nno successful visits yet");
    }
    for event in successes {
        let initial = event.initial_url.as_deref().unwrap_or("-");
        let final_url = event.final_url.as_deref().unwrap_or("-");
        text.push_str(&format!(
            "\n{initial} → {final_url} at {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    text
}
