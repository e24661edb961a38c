use url::Url;

use crate::{
    domain::{ChatId, UserId},
    errors::Error,
    Result,
};

/// Media attached to an incoming message.
///
/// Populated once by the transport adapter; the core only needs to know
/// whether something is attached and how to hand it back for re-sending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MediaKind {
    #[default]
    None,
    Photo {
        file_id: String,
    },
    Document {
        file_id: String,
        size: u64,
        file_name: Option<String>,
    },
    Video {
        file_id: String,
    },
    Audio {
        file_id: String,
    },
}

impl MediaKind {
    pub fn has_media(&self) -> bool {
        !matches!(self, MediaKind::None)
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::None => "none",
            MediaKind::Photo { .. } => "photo",
            MediaKind::Document { .. } => "document",
            MediaKind::Video { .. } => "video",
            MediaKind::Audio { .. } => "audio",
        }
    }
}

/// Read-only view of a message delivered by the transport.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    /// Message text, or the media caption.
    pub text: Option<String>,
    pub media: MediaKind,
    /// `None` when the transport does not expose sender details
    /// (e.g. anonymous channel posts).
    pub is_from_bot: Option<bool>,
}

impl IncomingMessage {
    pub fn text(chat_id: ChatId, sender_id: UserId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender_id,
            text: Some(text.into()),
            media: MediaKind::None,
            is_from_bot: None,
        }
    }

    pub fn with_media(mut self, media: MediaKind) -> Self {
        self.media = media;
        self
    }

    pub fn from_bot(mut self, is_bot: bool) -> Self {
        self.is_from_bot = Some(is_bot);
        self
    }

    /// Text if present and non-empty.
    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Clickable URL button attached under an outgoing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: Url,
}

impl LinkButton {
    pub fn new(label: impl Into<String>, link: &str) -> Result<Self> {
        Ok(Self {
            label: label.into(),
            url: parse_link(link)?,
        })
    }
}

/// Parse a channel link. Only absolute `http`, `https` and `tg` URLs are
/// accepted since Telegram rejects anything else in a URL button.
pub fn parse_link(link: &str) -> Result<Url> {
    let url = Url::parse(link.trim())
        .map_err(|e| Error::Validation(format!("invalid link {link:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" | "tg" => Ok(url),
        other => Err(Error::Validation(format!(
            "unsupported link scheme {other:?} in {link:?}"
        ))),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub media: MediaKind,
    pub button: Option<LinkButton>,
}

/// Result of resolving a chat id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub chat_id: ChatId,
    pub title: String,
}

/// The bot's own account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelfIdentity {
    pub user_id: UserId,
    pub username: String,
}
