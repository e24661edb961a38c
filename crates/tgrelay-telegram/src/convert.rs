//! Telegram types -> core message views.

use teloxide::types::{Chat, Message};

use tgrelay_core::{
    domain::{ChatId, UserId},
    messaging::types::{IncomingMessage, MediaKind},
};

/// Build the read-only core view of a Telegram message.
///
/// Messages sent on behalf of a chat (channel posts, anonymous admins) carry
/// `sender_chat`; those are attributed to that chat and the bot flag is
/// unknown, since `from` is a placeholder account there.
pub fn incoming_message(msg: &Message) -> IncomingMessage {
    let (sender_id, is_from_bot) = match (msg.sender_chat(), msg.from()) {
        (Some(chat), _) => (UserId(chat.id.0), None),
        (None, Some(user)) => (UserId(user.id.0 as i64), Some(user.is_bot)),
        (None, None) => (UserId(msg.chat.id.0), None),
    };

    IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        sender_id,
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
        media: media_of(msg),
        is_from_bot,
    }
}

pub fn media_of(msg: &Message) -> MediaKind {
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return MediaKind::Photo {
            file_id: photo.file.id.clone(),
        };
    }
    if let Some(doc) = msg.document() {
        return MediaKind::Document {
            file_id: doc.file.id.clone(),
            size: doc.file.size as u64,
            file_name: doc.file_name.clone(),
        };
    }
    if let Some(video) = msg.video() {
        return MediaKind::Video {
            file_id: video.file.id.clone(),
        };
    }
    if let Some(audio) = msg.audio() {
        return MediaKind::Audio {
            file_id: audio.file.id.clone(),
        };
    }
    MediaKind::None
}

/// Human-readable chat name: title, then `@username`, then the id.
pub fn chat_title(chat: &Chat) -> String {
    chat.title()
        .map(str::to_string)
        .or_else(|| chat.username().map(|u| format!("@{u}")))
        .unwrap_or_else(|| chat.id.0.to_string())
}
