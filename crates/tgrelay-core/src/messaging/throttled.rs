use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{ChatInfo, OutgoingMessage, SelfIdentity},
    },
    Result,
};

/// Per-chat limiters beyond this count trigger a sweep of idle ones.
const PRUNE_THRESHOLD: usize = 64;

type ChatLimiters = HashMap<i64, Arc<Mutex<IntervalLimiter>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* outbound Telegram calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between posts to the same chat (Telegram ~1 msg/sec per chat).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        self.reserve_at(Instant::now())
    }

    fn reserve_at(&mut self, now: Instant) -> Duration {
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that rate-limits outbound calls.
///
/// Relaying a burst from a busy source chat would otherwise hit Telegram 429s
/// on the destination chat. Chat lookups and `get_me` only take the global slot.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<ChatLimiters>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        if map.len() >= PRUNE_THRESHOLD && !map.contains_key(&chat_id) {
            prune_idle(&mut map, Instant::now());
        }
        map.entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_chat(&self, chat_id: i64) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let lim = self.limiter_for_chat(chat_id).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            debug!(chat_id, wait_ms = wait.as_millis() as u64, "Throttling outbound call");
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

/// Drop limiters nobody is using whose slot is already free. A fresh limiter
/// behaves identically, so nothing is lost; busy or pending ones stay.
fn prune_idle(map: &mut ChatLimiters, now: Instant) {
    let before = map.len();
    map.retain(|_, lim| {
        if Arc::strong_count(lim) > 1 {
            return true;
        }
        match lim.try_lock() {
            Ok(guard) => guard.next > now,
            Err(_) => true,
        }
    });
    debug!(before, after = map.len(), "Pruned idle chat limiters");
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_message(chat_id, msg).await
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_html(chat_id, html).await
    }

    async fn resolve_chat(&self, chat_id: ChatId) -> Result<ChatInfo> {
        self.throttle_global().await;
        self.inner.resolve_chat(chat_id).await
    }

    async fn get_me(&self) -> Result<SelfIdentity> {
        self.throttle_global().await;
        self.inner.get_me().await
    }
}
