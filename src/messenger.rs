//! Outbound side of the chat gateway.

use async_trait::async_trait;
use teloxide::prelude::*;

pub type SendResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Delivers plain text to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> SendResult;
}

#[async_trait]
impl Messenger for Bot {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> SendResult {
        self.send_message(chat_id, text).await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod recording {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    /// Keeps every message instead of sending it. Chats listed in
    /// `unreachable` fail delivery.
    #[derive(Default)]
    pub struct RecordingMessenger {
        sent: Mutex<Vec<(ChatId, String)>>,
        unreachable: HashSet<ChatId>,
    }

    impl RecordingMessenger {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_unreachable(chats: &[ChatId]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                unreachable: chats.iter().copied().collect(),
            }
        }

        pub fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter(|(id, _)| *id == chat_id)
                .map(|(_, text)| text)
                .collect()
        }

        pub fn last_to(&self, chat_id: ChatId) -> Option<String> {
            self.sent_to(chat_id).pop()
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> SendResult {
            if self.unreachable.contains(&chat_id) {
                return Err(format!("chat {} is unreachable", chat_id.0).into());
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
    }
}
