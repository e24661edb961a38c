use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Utc;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::time::timeout;
use tracing::{info, warn};

use tgrelay_core::{
    commands::{AdminDispatcher, ConfigSummary},
    config::Config,
    controller::ForwardingController,
    domain::{ChatId, RelayRoute},
    formatting::{escape_html, format_duration, format_timestamp},
    messaging::{
        port::MessagingPort,
        throttled::ThrottledMessenger,
        types::SelfIdentity,
    },
    state::{ForwardConfig, RelayState, SharedState, StatsSnapshot},
};

use crate::handlers;
use crate::TelegramMessenger;

/// Upper bound on the goodbye message; a stuck API call must not hold exit.
const SHUTDOWN_NOTICE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub route: RelayRoute,
    pub controller: Arc<ForwardingController>,
    pub dispatcher: Arc<AdminDispatcher>,
}

/// Verify access, then relay until Ctrl-C.
///
/// Bot identity and both chats must resolve before anything is relayed; any
/// failure there aborts startup.
pub async fn run_polling(cfg: Config) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> =
        Arc::new(ThrottledMessenger::new(raw_messenger, cfg.throttle));

    let me = messenger
        .get_me()
        .await
        .context("failed to connect to Telegram (check TELEGRAM_BOT_TOKEN)")?;
    info!(username = %me.username, user_id = me.user_id.0, "Connected to Telegram");

    let route = cfg.route();
    verify_chat(messenger.as_ref(), "source", route.source).await?;
    verify_chat(messenger.as_ref(), "destination", route.destination).await?;

    let shared = RelayState::new(cfg.forward_config(), cfg.start_forwarding).into_shared();
    let controller = Arc::new(ForwardingController::new(
        shared.clone(),
        messenger.clone(),
        route,
        me.user_id,
    ));
    let dispatcher = Arc::new(AdminDispatcher::new(
        shared.clone(),
        messenger.clone(),
        route,
        ConfigSummary::from(&cfg),
    ));

    let notice = {
        let st = shared.lock().await;
        startup_notice(&me, &route, &st.forward, st.bot.is_forwarding)
    };
    if let Err(e) = messenger.send_html(admin_chat(&route), &notice).await {
        warn!(error = %e, "Startup notification failed");
    }

    let state = Arc::new(AppState {
        route,
        controller,
        dispatcher,
    });

    let handler = dptree::entry()
        .branch(Update::filter_channel_post().endpoint(handlers::handle_channel_post))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    info!(
        source = route.source.0,
        destination = route.destination.0,
        forwarding = cfg.start_forwarding,
        "Relay running"
    );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    shutdown(
        &shared,
        messenger.as_ref(),
        &route,
        SHUTDOWN_NOTICE_TIMEOUT,
    )
    .await;
    Ok(())
}

async fn verify_chat(
    messenger: &dyn MessagingPort,
    label: &str,
    chat_id: ChatId,
) -> anyhow::Result<()> {
    let chat = messenger
        .resolve_chat(chat_id)
        .await
        .with_context(|| format!("cannot access {label} chat {}", chat_id.0))?;
    info!(chat_id = chat_id.0, title = %chat.title, "Verified {label} chat");
    Ok(())
}

async fn shutdown(
    shared: &SharedState,
    messenger: &dyn MessagingPort,
    route: &RelayRoute,
    notice_timeout: Duration,
) {
    info!("Shutting down");
    let snap = shared.lock().await.bot.snapshot();

    match snap.to_json() {
        Ok(json) => info!(stats = %json, "Final statistics"),
        Err(e) => warn!(error = %e, "Could not serialize final statistics"),
    }

    // Send errors are ignored; the process is exiting either way.
    let notice = shutdown_notice(&snap);
    if timeout(notice_timeout, messenger.send_html(admin_chat(route), &notice))
        .await
        .is_err()
    {
        warn!(
            timeout_ms = notice_timeout.as_millis() as u64,
            "Shutdown notification timed out"
        );
    }
}

/// The admin's private chat shares the admin's user id.
fn admin_chat(route: &RelayRoute) -> ChatId {
    ChatId(route.admin.0)
}

fn startup_notice(
    me: &SelfIdentity,
    route: &RelayRoute,
    forward: &ForwardConfig,
    forwarding: bool,
) -> String {
    let status = if forwarding { "Active" } else { "Inactive" };
    let lines = [
        "🤖 <b>Bot Started Successfully!</b>".to_string(),
        String::new(),
        format!("✅ Connected as: @{}", escape_html(&me.username)),
        format!("📅 Started at: {}", format_timestamp(&Utc::now())),
        format!("🔄 Forwarding Status: {status}"),
        String::new(),
        "<b>Configuration:</b>".to_string(),
        format!("📥 Source Group: <code>{}</code>", route.source.0),
        format!("📤 Destination Group: <code>{}</code>", route.destination.0),
        format!("🔗 Channel Link: {}", escape_html(&forward.channel_link)),
        format!("📝 Reference: {}", escape_html(&forward.reference_text)),
        String::new(),
        "Use /help to see available commands.".to_string(),
    ];
    lines.join("\n")
}

fn shutdown_notice(snap: &StatsSnapshot) -> String {
    let lines = [
        "🤖 <b>Bot Shutting Down</b>".to_string(),
        String::new(),
        "📊 <b>Final Statistics:</b>".to_string(),
        format!("• Messages Forwarded: {}", snap.messages_forwarded),
        format!("• Messages Skipped: {}", snap.messages_skipped),
        format!("• Errors: {}", snap.errors_count),
        format!("• Uptime: {}", format_duration(snap.uptime_secs)),
        String::new(),
        format!("Bot stopped at: {}", format_timestamp(&Utc::now())),
    ];
    lines.join("\n")
}
