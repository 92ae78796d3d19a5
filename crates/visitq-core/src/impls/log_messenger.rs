//! LogMessenger - writes outbound messages to the log instead of a chat.

use async_trait::async_trait;

use crate::domain::{MessageRef, MessagingError, OwnerId};
use crate::ports::Messenger;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send_message(
        &self,
        chat: OwnerId,
        text: &str,
        reply_to: Option<MessageRef>,
    ) -> Result<(), MessagingError> {
        match reply_to {
            Some(reply_to) => tracing::info!(%chat, %reply_to, text, "outbound message"),
            None => tracing::info!(%chat, text, "outbound message"),
        }
        Ok(())
    }
}
