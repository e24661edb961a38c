//! Runtime state shared by the forwarding controller and the admin dispatcher.

use std::{collections::VecDeque, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{domain::UserId, Result};

pub const COMMAND_LOG_CAPACITY: usize = 100;
pub const ERROR_LOG_CAPACITY: usize = 50;

pub const DEFAULT_REFERENCE_TEXT: &str = "📢 Forwarded by Bot";
pub const DEFAULT_CHANNEL_LINK: &str = "https://t.me/your_channel";
pub const DEFAULT_MIN_MESSAGE_LENGTH: usize = 10;
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;

/// Relay settings. `reference_text` and `channel_link` can be changed by the
/// admin at runtime; the rest is fixed at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForwardConfig {
    pub reference_text: String,
    pub channel_link: String,
    pub min_message_length: usize,
    pub max_message_length: usize,
    pub forward_media: bool,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            reference_text: DEFAULT_REFERENCE_TEXT.to_string(),
            channel_link: DEFAULT_CHANNEL_LINK.to_string(),
            min_message_length: DEFAULT_MIN_MESSAGE_LENGTH,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            forward_media: true,
        }
    }
}

/// Fixed-capacity log; pushing past capacity drops the oldest entry.
#[derive(Clone, Debug)]
pub struct RingLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> RingLog<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The newest `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &T> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandLogEntry {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub args: String,
    pub user_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub message: String,
}

/// Point-in-time copy of the counters, for replies and the shutdown log line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub is_forwarding: bool,
    pub messages_forwarded: u64,
    pub messages_skipped: u64,
    pub errors_count: u64,
    pub start_time: DateTime<Utc>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub uptime_secs: i64,
    pub commands_logged: usize,
    pub errors_logged: usize,
}

impl StatsSnapshot {
    /// Share of evaluated messages that went out, in percent.
    pub fn success_rate(&self) -> f64 {
        let evaluated = (self.messages_forwarded + self.messages_skipped).max(1);
        self.messages_forwarded as f64 / evaluated as f64 * 100.0
    }

    /// Compact JSON for the shutdown log line.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Clone, Debug)]
pub struct BotState {
    pub is_forwarding: bool,
    pub messages_forwarded: u64,
    pub messages_skipped: u64,
    pub errors_count: u64,
    start_time: DateTime<Utc>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub command_log: RingLog<CommandLogEntry>,
    pub error_log: RingLog<ErrorLogEntry>,
}

impl Default for BotState {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState {
    pub fn new() -> Self {
        Self {
            is_forwarding: false,
            messages_forwarded: 0,
            messages_skipped: 0,
            errors_count: 0,
            start_time: Utc::now(),
            last_message_time: None,
            command_log: RingLog::with_capacity(COMMAND_LOG_CAPACITY),
            error_log: RingLog::with_capacity(ERROR_LOG_CAPACITY),
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn uptime(&self) -> Duration {
        Utc::now() - self.start_time
    }

    pub fn record_forwarded(&mut self) {
        self.messages_forwarded += 1;
        self.last_message_time = Some(Utc::now());
    }

    pub fn record_skipped(&mut self) {
        self.messages_skipped += 1;
    }

    pub fn log_error(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        self.error_log.push(ErrorLogEntry {
            timestamp: Utc::now(),
            kind: kind.into(),
            message: message.into(),
        });
        self.errors_count += 1;
    }

    pub fn log_command(&mut self, command: &str, args: &str, user: UserId) {
        self.command_log.push(CommandLogEntry {
            timestamp: Utc::now(),
            command: command.to_string(),
            args: args.to_string(),
            user_id: user.0,
        });
    }

    /// Fresh statistics: new start time, zeroed counters, empty logs.
    /// The forwarding flag is left as it is.
    pub fn reset_stats(&mut self) {
        let is_forwarding = self.is_forwarding;
        *self = Self::new();
        self.is_forwarding = is_forwarding;
    }

    pub fn errors_since(&self, cutoff: DateTime<Utc>) -> usize {
        self.error_log
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .count()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            is_forwarding: self.is_forwarding,
            messages_forwarded: self.messages_forwarded,
            messages_skipped: self.messages_skipped,
            errors_count: self.errors_count,
            start_time: self.start_time,
            last_message_time: self.last_message_time,
            uptime_secs: self.uptime().num_seconds(),
            commands_logged: self.command_log.len(),
            errors_logged: self.error_log.len(),
        }
    }
}

/// Everything mutable at runtime, behind one lock.
#[derive(Clone, Debug, Default)]
pub struct RelayState {
    pub bot: BotState,
    pub forward: ForwardConfig,
}

impl RelayState {
    pub fn new(forward: ForwardConfig, start_forwarding: bool) -> Self {
        let mut bot = BotState::new();
        bot.is_forwarding = start_forwarding;
        Self { bot, forward }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}

pub type SharedState = Arc<Mutex<RelayState>>;
