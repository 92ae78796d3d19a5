//! Messenger port - outbound chat messages.

use async_trait::async_trait;

use crate::domain::{MessageRef, MessagingError, OwnerId};

/// Fire-and-forget delivery. Callers attempt each message once.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        chat: OwnerId,
        text: &str,
        reply_to: Option<MessageRef>,
    ) -> Result<(), MessagingError>;
}
