//! Telegram adapter (teloxide).
//!
//! This crate implements the `tgrelay-core` MessagingPort over the Telegram
//! Bot API and feeds Telegram updates into the core controller/dispatcher.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode},
};

pub mod convert;
pub mod handlers;
pub mod router;

use tgrelay_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatInfo, LinkButton, MediaKind, OutgoingMessage, SelfIdentity},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn markup(button: &LinkButton) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
            button.label.clone(),
            button.url.clone(),
        )]])
    }

    fn msg_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    /// Media is re-sent by file id, so nothing is downloaded. The text rides
    /// along as the caption.
    async fn send_message(&self, chat_id: ChatId, out: &OutgoingMessage) -> Result<MessageRef> {
        let chat = Self::tg_chat(chat_id);
        let markup = out.button.as_ref().map(Self::markup);
        let caption = Some(out.text.clone()).filter(|t| !t.is_empty());

        // Each request type is its own builder, hence the repetition.
        let sent = match &out.media {
            MediaKind::None => {
                let mut req = self.bot.send_message(chat, out.text.clone());
                if let Some(m) = markup {
                    req = req.reply_markup(m);
                }
                req.await
            }
            MediaKind::Photo { file_id } => {
                let mut req = self.bot.send_photo(chat, InputFile::file_id(file_id.clone()));
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(m) = markup {
                    req = req.reply_markup(m);
                }
                req.await
            }
            MediaKind::Document { file_id, .. } => {
                let mut req = self
                    .bot
                    .send_document(chat, InputFile::file_id(file_id.clone()));
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(m) = markup {
                    req = req.reply_markup(m);
                }
                req.await
            }
            MediaKind::Video { file_id } => {
                let mut req = self.bot.send_video(chat, InputFile::file_id(file_id.clone()));
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(m) = markup {
                    req = req.reply_markup(m);
                }
                req.await
            }
            MediaKind::Audio { file_id } => {
                let mut req = self.bot.send_audio(chat, InputFile::file_id(file_id.clone()));
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(m) = markup {
                    req = req.reply_markup(m);
                }
                req.await
            }
        }
        .map_err(Self::map_err)?;

        Ok(Self::msg_ref(chat_id, &sent))
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html)
            .await
            .map_err(Self::map_err)?;

        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn resolve_chat(&self, chat_id: ChatId) -> Result<ChatInfo> {
        let chat = self
            .bot
            .get_chat(Self::tg_chat(chat_id))
            .await
            .map_err(Self::map_err)?;

        Ok(ChatInfo {
            chat_id,
            title: convert::chat_title(&chat),
        })
    }

    async fn get_me(&self) -> Result<SelfIdentity> {
        let me = self.bot.get_me().await.map_err(Self::map_err)?;
        Ok(SelfIdentity {
            user_id: UserId(me.user.id.0 as i64),
            username: me.username().to_string(),
        })
    }
}
