//! Startup configuration, read from the environment (and `.env`).

use std::{env, fmt, time::Duration};

use tracing::debug;

use crate::{
    domain::{ChatId, RelayRoute, UserId},
    errors::Error,
    formatting::mask_token,
    messaging::{throttled::ThrottleConfig, types::parse_link},
    state::{
        ForwardConfig, DEFAULT_CHANNEL_LINK, DEFAULT_MAX_MESSAGE_LENGTH,
        DEFAULT_MIN_MESSAGE_LENGTH, DEFAULT_REFERENCE_TEXT,
    },
    Result,
};

#[derive(Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub source_chat_id: ChatId,
    pub destination_chat_id: ChatId,
    pub admin_user_id: UserId,

    pub channel_link: String,
    pub reference_text: String,
    pub min_message_length: usize,
    pub max_message_length: usize,
    pub forward_media: bool,
    pub start_forwarding: bool,

    pub throttle: ThrottleConfig,
    /// Raw `RUST_LOG`, if set. Only shown in `/config`.
    pub log_filter: Option<String>,
}

/// Load `.env` from the working directory, if there is one. Variables that are
/// already set in the process environment win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("Ignoring unreadable .env: {e}"),
    }
}

impl Config {
    /// Read the process environment. Call [`load_dotenv`] first if `.env`
    /// should be honoured.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build and validate from an arbitrary key lookup. Every problem is
    /// collected so the operator sees them all at once.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { get: &get };
        let mut problems = Vec::new();

        let telegram_bot_token = env.str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.is_empty() {
            problems.push("TELEGRAM_BOT_TOKEN is required".to_string());
        }

        let source = env.required_id("SOURCE_CHAT_ID", &mut problems);
        let destination = env.required_id("DESTINATION_CHAT_ID", &mut problems);
        let admin = env.required_id("ADMIN_USER_ID", &mut problems);

        let channel_link = env
            .str("CHANNEL_LINK")
            .unwrap_or_else(|| DEFAULT_CHANNEL_LINK.to_string());
        if let Err(e) = parse_link(&channel_link) {
            problems.push(format!("CHANNEL_LINK: {e}"));
        }

        let reference_text = env
            .str("REFERENCE_TEXT")
            .unwrap_or_else(|| DEFAULT_REFERENCE_TEXT.to_string());

        let min_message_length = env
            .parsed::<usize>("MIN_MESSAGE_LENGTH", &mut problems)
            .unwrap_or(DEFAULT_MIN_MESSAGE_LENGTH);
        let max_message_length = env
            .parsed::<usize>("MAX_MESSAGE_LENGTH", &mut problems)
            .unwrap_or(DEFAULT_MAX_MESSAGE_LENGTH);
        if max_message_length <= min_message_length {
            problems.push(format!(
                "MAX_MESSAGE_LENGTH ({max_message_length}) must be greater than MIN_MESSAGE_LENGTH ({min_message_length})"
            ));
        }

        let forward_media = env.bool("FORWARD_MEDIA").unwrap_or(true);
        let start_forwarding = env.bool("START_FORWARDING").unwrap_or(false);

        let defaults = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: env
                .parsed::<u64>("THROTTLE_GLOBAL_MS", &mut problems)
                .map(Duration::from_millis)
                .unwrap_or(defaults.global_min_interval),
            per_chat_min_interval: env
                .parsed::<u64>("THROTTLE_PER_CHAT_MS", &mut problems)
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_chat_min_interval),
        };

        if source != 0 && source == destination {
            problems.push("SOURCE_CHAT_ID and DESTINATION_CHAT_ID must differ".to_string());
        }

        if !problems.is_empty() {
            return Err(Error::Config(problems.join("; ")));
        }

        Ok(Self {
            telegram_bot_token,
            source_chat_id: ChatId(source),
            destination_chat_id: ChatId(destination),
            admin_user_id: UserId(admin),
            channel_link,
            reference_text,
            min_message_length,
            max_message_length,
            forward_media,
            start_forwarding,
            throttle,
            log_filter: env.str("RUST_LOG"),
        })
    }

    pub fn route(&self) -> RelayRoute {
        RelayRoute {
            source: self.source_chat_id,
            destination: self.destination_chat_id,
            admin: self.admin_user_id,
        }
    }

    /// Initial relay settings; the admin can change some of them later.
    pub fn forward_config(&self) -> ForwardConfig {
        ForwardConfig {
            reference_text: self.reference_text.clone(),
            channel_link: self.channel_link.clone(),
            min_message_length: self.min_message_length,
            max_message_length: self.max_message_length,
            forward_media: self.forward_media,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &mask_token(&self.telegram_bot_token))
            .field("source_chat_id", &self.source_chat_id)
            .field("destination_chat_id", &self.destination_chat_id)
            .field("admin_user_id", &self.admin_user_id)
            .field("channel_link", &self.channel_link)
            .field("reference_text", &self.reference_text)
            .field("min_message_length", &self.min_message_length)
            .field("max_message_length", &self.max_message_length)
            .field("forward_media", &self.forward_media)
            .field("start_forwarding", &self.start_forwarding)
            .field("throttle", &self.throttle)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

struct EnvReader<'a> {
    get: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvReader<'_> {
    fn str(&self, key: &str) -> Option<String> {
        (self.get)(key).and_then(non_empty)
    }

    fn bool(&self, key: &str) -> Option<bool> {
        self.str(key).map(|s| {
            matches!(
                s.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }

    /// `None` when unset; a set-but-unparsable value is reported as a problem.
    fn parsed<T: std::str::FromStr>(&self, key: &str, problems: &mut Vec<String>) -> Option<T> {
        let raw = self.str(key)?;
        match raw.trim().parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                problems.push(format!("{key} has an invalid value: {raw:?}"));
                None
            }
        }
    }

    /// Required non-zero numeric id. Returns 0 after recording a problem.
    fn required_id(&self, key: &str, problems: &mut Vec<String>) -> i64 {
        if self.str(key).is_none() {
            problems.push(format!("{key} is required"));
            return 0;
        }
        match self.parsed::<i64>(key, problems) {
            Some(0) => {
                problems.push(format!("{key} must be non-zero"));
                0
            }
            Some(id) => id,
            None => 0,
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    const TOKEN: &str = "123456:ABCDEF-secret-token";

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
            ("SOURCE_CHAT_ID", "-1001".to_string()),
            ("DESTINATION_CHAT_ID", "-1002".to_string()),
            ("ADMIN_USER_ID", "42".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config> {
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    fn config_error(vars: &HashMap<&'static str, String>) -> String {
        match load(vars) {
            Err(Error::Config(msg)) => msg,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn minimal_env_uses_defaults() {
        let cfg = load(&base()).unwrap();
        assert_eq!(cfg.source_chat_id, ChatId(-1001));
        assert_eq!(cfg.destination_chat_id, ChatId(-1002));
        assert_eq!(cfg.admin_user_id, UserId(42));
        assert_eq!(cfg.forward_config(), ForwardConfig::default());
        assert!(!cfg.start_forwarding);
        assert_eq!(cfg.throttle, ThrottleConfig::default());
        assert_eq!(cfg.log_filter, None);
    }

    #[test]
    fn optional_values_override_defaults() {
        let mut vars = base();
        vars.insert("CHANNEL_LINK", "https://t.me/real_channel".into());
        vars.insert("REFERENCE_TEXT", "via relay".into());
        vars.insert("MIN_MESSAGE_LENGTH", "3".into());
        vars.insert("MAX_MESSAGE_LENGTH", "200".into());
        vars.insert("FORWARD_MEDIA", "false".into());
        vars.insert("START_FORWARDING", "yes".into());
        vars.insert("THROTTLE_GLOBAL_MS", "0".into());

        let cfg = load(&vars).unwrap();
        let fwd = cfg.forward_config();
        assert_eq!(fwd.channel_link, "https://t.me/real_channel");
        assert_eq!(fwd.reference_text, "via relay");
        assert_eq!(fwd.min_message_length, 3);
        assert_eq!(fwd.max_message_length, 200);
        assert!(!fwd.forward_media);
        assert!(cfg.start_forwarding);
        assert_eq!(cfg.throttle.global_min_interval, Duration::ZERO);
    }

    #[rstest]
    #[case("TELEGRAM_BOT_TOKEN", "TELEGRAM_BOT_TOKEN is required")]
    #[case("SOURCE_CHAT_ID", "SOURCE_CHAT_ID is required")]
    #[case("DESTINATION_CHAT_ID", "DESTINATION_CHAT_ID is required")]
    #[case("ADMIN_USER_ID", "ADMIN_USER_ID is required")]
    fn missing_required_value_is_reported(#[case] key: &str, #[case] expected: &str) {
        let mut vars = base();
        vars.remove(key);
        assert!(config_error(&vars).contains(expected));
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut vars = base();
        vars.remove("TELEGRAM_BOT_TOKEN");
        vars.insert("ADMIN_USER_ID", "not-a-number".into());
        vars.insert("MAX_MESSAGE_LENGTH", "5".into());

        let msg = config_error(&vars);
        assert!(msg.contains("TELEGRAM_BOT_TOKEN"));
        assert!(msg.contains("ADMIN_USER_ID has an invalid value"));
        assert!(msg.contains("must be greater than MIN_MESSAGE_LENGTH"));
    }

    #[test]
    fn zero_ids_are_rejected() {
        let mut vars = base();
        vars.insert("ADMIN_USER_ID", "0".into());
        assert!(config_error(&vars).contains("ADMIN_USER_ID must be non-zero"));
    }

    #[test]
    fn source_and_destination_must_differ() {
        let mut vars = base();
        vars.insert("DESTINATION_CHAT_ID", "-1001".into());
        assert!(config_error(&vars).contains("must differ"));
    }

    #[test]
    fn channel_link_must_be_a_url() {
        let mut vars = base();
        vars.insert("CHANNEL_LINK", "t.me/no_scheme".into());
        assert!(config_error(&vars).contains("CHANNEL_LINK"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut vars = base();
        vars.insert("REFERENCE_TEXT", "   ".into());
        let cfg = load(&vars).unwrap();
        assert_eq!(cfg.reference_text, DEFAULT_REFERENCE_TEXT);
    }

    #[test]
    fn debug_output_masks_token() {
        let cfg = load(&base()).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains(TOKEN));
        assert!(dbg.contains("1234***oken"));
    }

    #[test]
    fn load_reads_process_environment() {
        // No other test in this binary touches these keys.
        for (k, v) in base() {
            env::set_var(k, v);
        }
        env::set_var("SOURCE_CHAT_ID", "-1777");

        let cfg = Config::load().unwrap();
        assert_eq!(cfg.source_chat_id, ChatId(-1777));
        assert_eq!(cfg.admin_user_id, UserId(42));
    }
}
