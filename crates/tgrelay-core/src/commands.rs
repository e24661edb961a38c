//! Admin commands: authorization, parsing, the command table and handlers.
//!
//! Replies are Telegram HTML. Anything the admin typed or configured is
//! escaped before it goes into a reply.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::{
    config::Config,
    domain::{ChatId, RelayRoute, UserId},
    formatting::{
        escape_html, format_duration, format_optional_timestamp, format_timestamp, mask_token,
        truncate_chars,
    },
    messaging::{port::MessagingPort, types::parse_link},
    state::SharedState,
};

pub const UNAUTHORIZED_REPLY: &str = "❌ Unauthorized. Only admin can use bot commands.";
pub const NO_ERRORS_REPLY: &str = "✅ No recent errors found!";

const LOGS_SHOWN: usize = 10;
const LOG_MESSAGE_MAX_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminCommand {
    Start,
    Stop,
    Test,
    Status,
    Stats,
    Help,
    Config,
    Logs,
    ResetStats,
    UpdateReference,
    UpdateChannel,
    Unknown,
}

impl AdminCommand {
    /// `name` is the lower-cased command token including the leading `/`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "/start" => Self::Start,
            "/stop" => Self::Stop,
            "/test" => Self::Test,
            "/status" => Self::Status,
            "/stats" => Self::Stats,
            "/help" => Self::Help,
            "/config" => Self::Config,
            "/logs" => Self::Logs,
            "/reset_stats" => Self::ResetStats,
            "/update_reference" => Self::UpdateReference,
            "/update_channel" => Self::UpdateChannel,
            _ => Self::Unknown,
        }
    }
}

/// Split a command line into `(command, args)`.
///
/// The command is lower-cased and loses any `@botname` suffix Telegram adds in
/// groups; args are the trimmed remainder.
pub fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first.split('@').next().unwrap_or("").to_lowercase();

    (cmd, rest)
}

/// Startup settings shown by `/config` that are not part of the live state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigSummary {
    pub masked_token: String,
    pub log_filter: String,
}

impl From<&Config> for ConfigSummary {
    fn from(cfg: &Config) -> Self {
        Self {
            masked_token: mask_token(&cfg.telegram_bot_token),
            log_filter: cfg
                .log_filter
                .clone()
                .unwrap_or_else(|| "default".to_string()),
        }
    }
}

pub struct AdminDispatcher {
    shared: SharedState,
    messenger: Arc<dyn MessagingPort>,
    route: RelayRoute,
    summary: ConfigSummary,
}

impl AdminDispatcher {
    pub fn new(
        shared: SharedState,
        messenger: Arc<dyn MessagingPort>,
        route: RelayRoute,
        summary: ConfigSummary,
    ) -> Self {
        Self {
            shared,
            messenger,
            route,
            summary,
        }
    }

    /// Dispatch and send the reply back to `chat_id`. A failed reply is
    /// logged; the command has already taken effect.
    pub async fn handle(&self, chat_id: ChatId, sender: UserId, text: &str) {
        let reply = self.dispatch(sender, text).await;
        if let Err(e) = self.messenger.send_html(chat_id, &reply).await {
            warn!(chat_id = chat_id.0, error = %e, "Failed to deliver admin reply");
        }
    }

    /// Run one command line and return exactly one reply.
    pub async fn dispatch(&self, sender: UserId, text: &str) -> String {
        if sender != self.route.admin {
            warn!(user_id = sender.0, "Rejected command from non-admin user");
            return UNAUTHORIZED_REPLY.to_string();
        }

        let (cmd, args) = parse_command(text);
        self.shared.lock().await.bot.log_command(&cmd, &args, sender);
        info!(command = %cmd, "Admin command");

        match AdminCommand::from_name(&cmd) {
            AdminCommand::Start => self.set_forwarding(true).await,
            AdminCommand::Stop => self.set_forwarding(false).await,
            AdminCommand::Test => self.test_connection().await,
            AdminCommand::Status => self.status().await,
            AdminCommand::Stats => self.detailed_stats().await,
            AdminCommand::Help => help_text(),
            AdminCommand::Config => self.config().await,
            AdminCommand::Logs => self.logs().await,
            AdminCommand::ResetStats => self.reset_stats().await,
            AdminCommand::UpdateReference => self.update_reference(&args).await,
            AdminCommand::UpdateChannel => self.update_channel(&args).await,
            AdminCommand::Unknown => format!(
                "❓ Unknown command: {}\n\nUse /help to see available commands.",
                escape_html(&cmd)
            ),
        }
    }

    async fn set_forwarding(&self, on: bool) -> String {
        self.shared.lock().await.bot.is_forwarding = on;
        if on {
            info!("Message forwarding started by admin");
            "✅ <b>Message forwarding started!</b>\n\nBot is now actively forwarding messages from source to destination group.".to_string()
        } else {
            info!("Message forwarding stopped by admin");
            "⏹️ <b>Message forwarding stopped!</b>\n\nBot has stopped forwarding messages."
                .to_string()
        }
    }

    async fn status(&self) -> String {
        let snap = self.shared.lock().await.bot.snapshot();
        let status = if snap.is_forwarding {
            "🟢 <b>ACTIVE</b>"
        } else {
            "🔴 <b>INACTIVE</b>"
        };

        let lines = [
            "🤖 <b>Bot Status Report</b>".to_string(),
            String::new(),
            format!("📊 <b>Current Status:</b> {status}"),
            format!("⏱️ <b>Uptime:</b> {}", format_duration(snap.uptime_secs)),
            format!("📈 <b>Messages Forwarded:</b> {}", snap.messages_forwarded),
            format!("⏭️ <b>Messages Skipped:</b> {}", snap.messages_skipped),
            format!("❌ <b>Errors:</b> {}", snap.errors_count),
            String::new(),
            format!("📅 <b>Started:</b> {}", format_timestamp(&snap.start_time)),
            format!(
                "🕐 <b>Last Message:</b> {}",
                format_optional_timestamp(snap.last_message_time.as_ref())
            ),
            String::new(),
            "Use /stats for detailed statistics.".to_string(),
        ];
        lines.join("\n")
    }

    async fn detailed_stats(&self) -> String {
        let (snap, forward, recent_errors) = {
            let st = self.shared.lock().await;
            let cutoff = Utc::now() - Duration::hours(24);
            (st.bot.snapshot(), st.forward.clone(), st.bot.errors_since(cutoff))
        };

        let lines = [
            "📊 <b>Detailed Bot Statistics</b>".to_string(),
            String::new(),
            "<b>📈 Performance Metrics:</b>".to_string(),
            format!("• Messages Forwarded: {}", snap.messages_forwarded),
            format!("• Messages Skipped: {}", snap.messages_skipped),
            format!("• Success Rate: {:.1}%", snap.success_rate()),
            format!("• Error Count: {}", snap.errors_count),
            String::new(),
            "<b>⏱️ Time Information:</b>".to_string(),
            format!("• Bot Started: {}", format_timestamp(&snap.start_time)),
            format!("• Uptime: {}", format_duration(snap.uptime_secs)),
            format!(
                "• Last Activity: {}",
                format_optional_timestamp(snap.last_message_time.as_ref())
            ),
            String::new(),
            "<b>🔧 Configuration:</b>".to_string(),
            format!("• Source Group: <code>{}</code>", self.route.source.0),
            format!("• Destination Group: <code>{}</code>", self.route.destination.0),
            format!("• Channel Link: {}", escape_html(&forward.channel_link)),
            format!("• Reference Text: {}", escape_html(&forward.reference_text)),
            String::new(),
            "<b>📝 Recent Activity:</b>".to_string(),
            format!("• Commands Executed: {}", snap.commands_logged),
            format!("• Recent Errors (24h): {recent_errors}"),
            String::new(),
            "Use /logs to view recent errors.".to_string(),
        ];
        lines.join("\n")
    }

    async fn config(&self) -> String {
        let forward = self.shared.lock().await.forward.clone();
        let check = |on: bool| if on { "✅" } else { "❌" };

        let lines = [
            "⚙️ <b>Bot Configuration</b>".to_string(),
            String::new(),
            "<b>📱 Telegram Settings:</b>".to_string(),
            format!(
                "• Bot Token: <code>{}</code>",
                escape_html(&self.summary.masked_token)
            ),
            String::new(),
            "<b>📢 Group Settings:</b>".to_string(),
            format!("• Source Group ID: <code>{}</code>", self.route.source.0),
            format!(
                "• Destination Group ID: <code>{}</code>",
                self.route.destination.0
            ),
            String::new(),
            "<b>🎨 Customization:</b>".to_string(),
            format!("• Channel Link: {}", escape_html(&forward.channel_link)),
            format!("• Reference Text: {}", escape_html(&forward.reference_text)),
            String::new(),
            "<b>🔧 Advanced Settings:</b>".to_string(),
            format!("• Min Message Length: {}", forward.min_message_length),
            format!("• Max Message Length: {}", forward.max_message_length),
            format!("• Forward Media: {}", check(forward.forward_media)),
            format!(
                "• Log Filter: <code>{}</code>",
                escape_html(&self.summary.log_filter)
            ),
            String::new(),
            "<b>👤 Admin Settings:</b>".to_string(),
            format!("• Admin User ID: <code>{}</code>", self.route.admin.0),
            String::new(),
            "Use /update_reference or /update_channel to modify settings.".to_string(),
        ];
        lines.join("\n")
    }

    async fn logs(&self) -> String {
        let st = self.shared.lock().await;
        let log = &st.bot.error_log;
        if log.is_empty() {
            return NO_ERRORS_REPLY.to_string();
        }

        let mut out = String::from("🚨 <b>Recent Error Logs:</b>\n\n");
        let mut shown = 0;
        for (i, entry) in log.last_n(LOGS_SHOWN).enumerate() {
            out.push_str(&format!(
                "<b>{}.</b> <code>{}</code> - {}\n   {}\n\n",
                i + 1,
                entry.timestamp.format("%m-%d %H:%M"),
                escape_html(&entry.kind),
                escape_html(&truncate_chars(&entry.message, LOG_MESSAGE_MAX_CHARS)),
            ));
            shown += 1;
        }
        out.push_str(&format!(
            "Showing {shown} of {} total errors.",
            log.len()
        ));
        out
    }

    async fn reset_stats(&self) -> String {
        self.shared.lock().await.bot.reset_stats();
        info!("Bot statistics reset by admin");
        "🔄 <b>Statistics Reset</b>\n\nAll bot statistics have been reset to zero.".to_string()
    }

    async fn update_reference(&self, args: &str) -> String {
        if args.is_empty() {
            return "❌ Please provide new reference text.\nUsage: /update_reference &lt;new text&gt;"
                .to_string();
        }

        self.shared.lock().await.forward.reference_text = args.to_string();
        info!("Reference text updated by admin");
        format!(
            "✅ <b>Reference text updated!</b>\n\nNew reference: {}",
            escape_html(args)
        )
    }

    async fn update_channel(&self, args: &str) -> String {
        if args.is_empty() {
            return "❌ Please provide new channel link.\nUsage: /update_channel &lt;new link&gt;"
                .to_string();
        }

        if let Err(e) = parse_link(args) {
            return format!(
                "❌ Invalid channel link: {}\n\nUse an absolute http(s) or tg:// link.",
                escape_html(&e.to_string())
            );
        }

        self.shared.lock().await.forward.channel_link = args.to_string();
        info!(link = %args, "Channel link updated by admin");
        format!(
            "✅ <b>Channel link updated!</b>\n\nNew link: {}",
            escape_html(args)
        )
    }

    /// Live transport checks. Each failure is reported inline.
    async fn test_connection(&self) -> String {
        let mut results = Vec::new();

        match self.messenger.get_me().await {
            Ok(me) => results.push(format!(
                "✅ Telegram connection: OK (@{})",
                escape_html(&me.username)
            )),
            Err(e) => results.push(format!(
                "❌ Telegram connection: {}",
                escape_html(&e.to_string())
            )),
        }

        for (label, chat_id) in [
            ("Source group access", self.route.source),
            ("Destination group access", self.route.destination),
        ] {
            match self.messenger.resolve_chat(chat_id).await {
                Ok(chat) => results.push(format!(
                    "✅ {label}: OK ({})",
                    escape_html(&chat.title)
                )),
                Err(e) => results.push(format!(
                    "❌ {label}: {}",
                    escape_html(&e.to_string())
                )),
            }
        }

        format!(
            "🔍 <b>Connection Test Results:</b>\n\n{}",
            results.join("\n")
        )
    }
}

fn help_text() -> String {
    "🤖 <b>Telegram Relay Bot - Admin Commands</b>

<b>🔄 Control Commands:</b>
/start - Start message forwarding
/stop - Stop message forwarding
/test - Test bot connection and configuration

<b>📊 Monitoring Commands:</b>
/status - View current bot status
/stats - View detailed statistics
/logs - View recent error logs
/config - View bot configuration

<b>⚙️ Configuration Commands:</b>
/update_reference &lt;text&gt; - Update reference text
/update_channel &lt;link&gt; - Update channel link
/reset_stats - Reset bot statistics

<b>ℹ️ Information Commands:</b>
/help - Show this help message"
        .to_string()
}
