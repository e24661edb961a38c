//! One inbound source-chat event, end to end: gate, filter, transform, send,
//! bookkeeping.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    composer::compose,
    decision::evaluate,
    domain::{RelayRoute, UserId},
    messaging::{
        port::MessagingPort,
        types::{IncomingMessage, LinkButton, MediaKind, OutgoingMessage},
    },
    sanitizer::{self, ProcessingStats},
    state::SharedState,
    Result,
};

pub const CHANNEL_BUTTON_LABEL: &str = "🔗 Join Our Channel";
pub const PROCESSING_ERROR_KIND: &str = "Message processing error";
pub const REASON_NOTHING_LEFT: &str = "no content after processing";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Forwarding is switched off.
    Dropped,
    /// The bot's own message.
    SelfEcho,
    Skipped(&'static str),
    Forwarded,
    Failed(String),
}

pub struct ForwardingController {
    shared: SharedState,
    messenger: Arc<dyn MessagingPort>,
    route: RelayRoute,
    self_id: UserId,
}

impl ForwardingController {
    pub fn new(
        shared: SharedState,
        messenger: Arc<dyn MessagingPort>,
        route: RelayRoute,
        self_id: UserId,
    ) -> Self {
        Self {
            shared,
            messenger,
            route,
            self_id,
        }
    }

    pub async fn is_forwarding(&self) -> bool {
        self.shared.lock().await.bot.is_forwarding
    }

    /// Entry point for every source-chat event. Nothing is evaluated or
    /// counted while forwarding is off.
    pub async fn handle_event(&self, message: &IncomingMessage) -> ForwardOutcome {
        if !self.is_forwarding().await {
            debug!(chat_id = message.chat_id.0, "Forwarding disabled, dropping event");
            return ForwardOutcome::Dropped;
        }
        self.on_source_message(message).await
    }

    pub async fn on_source_message(&self, message: &IncomingMessage) -> ForwardOutcome {
        if message.sender_id == self.self_id {
            debug!("Ignoring own message");
            return ForwardOutcome::SelfEcho;
        }

        // Snapshot the settings; the lock is not held across the send.
        let forward = self.shared.lock().await.forward.clone();

        let verdict = evaluate(message, forward.min_message_length);
        if !verdict.approved {
            self.shared.lock().await.bot.record_skipped();
            info!(reason = verdict.reason, sender = message.sender_id.0, "Message skipped");
            return ForwardOutcome::Skipped(verdict.reason);
        }

        let original = message.text_content().unwrap_or("");
        let body = sanitizer::normalize(&sanitizer::strip(original));
        let text = compose(&body, &forward);

        let media = if forward.forward_media {
            message.media.clone()
        } else {
            MediaKind::None
        };

        if text.is_empty() && !media.has_media() {
            self.shared.lock().await.bot.record_skipped();
            info!(reason = REASON_NOTHING_LEFT, "Message skipped");
            return ForwardOutcome::Skipped(REASON_NOTHING_LEFT);
        }

        match self.send(text, media, &forward.channel_link).await {
            Ok(()) => {
                self.shared.lock().await.bot.record_forwarded();
                let stats = ProcessingStats::measure(original, &body);
                debug!(
                    original_len = stats.original_len,
                    processed_len = stats.processed_len,
                    links_removed = stats.links_removed,
                    mentions_removed = stats.mentions_removed,
                    reduction = stats.reduction_percentage,
                    "Processed message"
                );
                info!(
                    media = message.media.label(),
                    destination = self.route.destination.0,
                    "Message forwarded"
                );
                ForwardOutcome::Forwarded
            }
            Err(e) => {
                let msg = e.to_string();
                self.shared
                    .lock()
                    .await
                    .bot
                    .log_error(PROCESSING_ERROR_KIND, msg.clone());
                warn!(error = %msg, "Failed to forward message");
                ForwardOutcome::Failed(msg)
            }
        }
    }

    async fn send(&self, text: String, media: MediaKind, channel_link: &str) -> Result<()> {
        let button = LinkButton::new(CHANNEL_BUTTON_LABEL, channel_link)?;
        let out = OutgoingMessage {
            text,
            media,
            button: Some(button),
        };
        self.messenger
            .send_message(self.route.destination, &out)
            .await?;
        Ok(())
    }
}
