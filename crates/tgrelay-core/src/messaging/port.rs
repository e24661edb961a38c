use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatInfo, OutgoingMessage, SelfIdentity},
    Result,
};

/// Transport port.
///
/// Telegram is the implementation; the controller, the dispatcher and the
/// startup checks only ever talk to the transport through this trait.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Post a relayed message (text, optional media, optional link button).
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef>;

    /// Post an HTML-formatted notice (admin replies, startup/shutdown notices).
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Look a chat up by id; fails when the bot has no access to it.
    async fn resolve_chat(&self, chat_id: ChatId) -> Result<ChatInfo>;

    /// The bot's own account.
    async fn get_me(&self) -> Result<SelfIdentity>;
}
