//! Telegram update handlers.
//!
//! Routing only: source-chat traffic goes to the forwarding controller,
//! admin/private text goes to the command dispatcher.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::debug;

use tgrelay_core::{
    controller::ForwardOutcome,
    domain::{ChatId, RelayRoute, UserId},
};

use crate::{convert::incoming_message, router::AppState};

/// Where a message should go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Forward,
    Command,
    Ignore,
}

/// Decide the route for a message.
///
/// In the source chat only `/commands` from the admin are diverted to the
/// dispatcher; everything else there is a relay candidate. Elsewhere the
/// admin's text and any private text are commands (strangers get the
/// unauthorized reply).
pub fn classify(
    route: &RelayRoute,
    chat_id: ChatId,
    sender: Option<UserId>,
    text: Option<&str>,
    is_private: bool,
) -> Route {
    let from_admin = sender == Some(route.admin);
    let is_command = text.is_some_and(|t| t.trim_start().starts_with('/'));

    if chat_id == route.source {
        if from_admin && is_command {
            return Route::Command;
        }
        return Route::Forward;
    }

    if text.is_some() && sender.is_some() && (from_admin || is_private) {
        return Route::Command;
    }

    Route::Ignore
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);
    let sender = msg.from().map(|u| UserId(u.id.0 as i64));

    match classify(
        &state.route,
        chat_id,
        sender,
        msg.text(),
        msg.chat.is_private(),
    ) {
        Route::Forward => forward(&msg, &state).await,
        Route::Command => {
            if let (Some(sender), Some(text)) = (sender, msg.text()) {
                state.dispatcher.handle(chat_id, sender, text).await;
            }
        }
        Route::Ignore => debug!(chat_id = chat_id.0, "Ignoring message outside relay route"),
    }

    Ok(())
}

/// Channel posts have no user sender; only the source channel matters.
pub async fn handle_channel_post(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.chat.id.0 == state.route.source.0 {
        forward(&msg, &state).await;
    }
    Ok(())
}

async fn forward(msg: &Message, state: &AppState) {
    let incoming = incoming_message(msg);
    let outcome = state.controller.handle_event(&incoming).await;
    if let ForwardOutcome::Failed(e) = outcome {
        debug!(message_id = msg.id.0, error = %e, "Relay failed");
    }
}
