use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tgrelay_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::{
        port::MessagingPort,
        types::{ChatInfo, OutgoingMessage, SelfIdentity},
    },
    Error, Result,
};

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub message: OutgoingMessage,
}

#[derive(Debug, Clone)]
pub struct SentHtml {
    pub chat_id: ChatId,
    pub html: String,
}

/// Records every outbound call. Individual operations can be told to fail.
pub struct MockMessenger {
    pub sent: Arc<Mutex<Vec<SentMessage>>>,
    pub html: Arc<Mutex<Vec<SentHtml>>>,
    pub fail_send: bool,
    pub fail_html: bool,
    pub fail_get_me: bool,
    /// Chats that resolve; everything else fails.
    pub known_chats: Vec<(ChatId, String)>,
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            html: Arc::new(Mutex::new(Vec::new())),
            fail_send: false,
            fail_html: false,
            fail_get_me: false,
            known_chats: Vec::new(),
        }
    }

    pub fn failing_sends() -> Self {
        Self {
            fail_send: true,
            ..Self::new()
        }
    }

    pub fn with_chat(mut self, chat_id: ChatId, title: &str) -> Self {
        self.known_chats.push((chat_id, title.to_string()));
        self
    }

    pub fn get_sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn get_html(&self) -> Vec<SentHtml> {
        self.html.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for MockMessenger {
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef> {
        if self.fail_send {
            return Err(Error::External("Forbidden: bot was kicked".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            chat_id,
            message: msg.clone(),
        });
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sent.len() as i32),
        })
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        if self.fail_html {
            return Err(Error::External("Bad Request: chat not found".to_string()));
        }
        let mut sent = self.html.lock().unwrap();
        sent.push(SentHtml {
            chat_id,
            html: html.to_string(),
        });
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sent.len() as i32),
        })
    }

    async fn resolve_chat(&self, chat_id: ChatId) -> Result<ChatInfo> {
        self.known_chats
            .iter()
            .find(|(id, _)| *id == chat_id)
            .map(|(id, title)| ChatInfo {
                chat_id: *id,
                title: title.clone(),
            })
            .ok_or_else(|| Error::External("Bad Request: chat not found".to_string()))
    }

    async fn get_me(&self) -> Result<SelfIdentity> {
        if self.fail_get_me {
            return Err(Error::External("Unauthorized".to_string()));
        }
        Ok(SelfIdentity {
            user_id: UserId(9_000),
            username: "relay_bot".to_string(),
        })
    }
}
