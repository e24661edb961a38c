//! Relay policy: does an incoming message qualify for forwarding?

use crate::{messaging::types::IncomingMessage, sanitizer};

pub const REASON_EMPTY: &str = "empty message";
pub const REASON_TOO_SHORT: &str = "too short";
pub const REASON_LINK_ONLY: &str = "link-only content";
pub const REASON_FROM_BOT: &str = "sender is bot";
pub const REASON_APPROVED: &str = "approved";

/// Anything shorter than this after link stripping is treated as spam.
const MIN_MEANINGFUL_CHARS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub approved: bool,
    pub reason: &'static str,
}

impl Verdict {
    fn reject(reason: &'static str) -> Self {
        Self {
            approved: false,
            reason,
        }
    }

    fn approve() -> Self {
        Self {
            approved: true,
            reason: REASON_APPROVED,
        }
    }
}

/// First matching rule wins. Never fails and never touches bot state.
pub fn evaluate(message: &IncomingMessage, min_length: usize) -> Verdict {
    let text = message.text_content();

    if text.is_none() && !message.media.has_media() {
        return Verdict::reject(REASON_EMPTY);
    }

    if let Some(text) = text {
        if text.trim().chars().count() < min_length {
            return Verdict::reject(REASON_TOO_SHORT);
        }
        if sanitizer::strip(text).trim().chars().count() < MIN_MEANINGFUL_CHARS {
            return Verdict::reject(REASON_LINK_ONLY);
        }
    }

    if message.is_from_bot == Some(true) {
        return Verdict::reject(REASON_FROM_BOT);
    }

    Verdict::approve()
}
