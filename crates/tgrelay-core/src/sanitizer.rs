//! Text cleanup for relayed messages: link/mention stripping and formatting
//! normalization.
//!
//! Everything here is pure. Patterns are compiled once and shared.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

struct Patterns {
    http: Regex,
    www: Regex,
    domain: Regex,
    telegram_link: Regex,
    tg_scheme: Regex,
    mention: Regex,
    join_phrase: Regex,
    telegram_phrase: Regex,
    whitespace: Regex,
    blank_lines: Regex,
    emoji_run: Regex,
    exclaim_run: Regex,
    question_run: Regex,
    dot_run: Regex,
    caps_run: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        Patterns {
            http: re(r"(?i)https?://\S+"),
            www: re(r"(?i)www\.\S+"),
            domain: re(r"(?i)[a-z0-9-]+\.[a-z]{2,}\S*"),
            telegram_link: re(r"(?i)(?:https?://)?(?:t\.me|telegram\.me)/\S+"),
            tg_scheme: re(r"(?i)tg://\S+"),
            mention: re(r"@[A-Za-z0-9_]+"),
            join_phrase: re(r"(?i)(?:join|channel|group)\s*:\s*@?[a-z0-9_]+"),
            telegram_phrase: re(
                r"(?i)(?:telegram|tg)\s*(?:channel|group|chat)\s*:?\s*@?[a-z0-9_]+",
            ),
            whitespace: re(r"\s+"),
            blank_lines: re(r"\n\s*\n"),
            emoji_run: re(
                r"([\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}\x{1F1E0}-\x{1F1FF}]){4,}",
            ),
            exclaim_run: re(r"!{4,}"),
            question_run: re(r"\?{4,}"),
            dot_run: re(r"\.{4,}"),
            caps_run: re(r"[A-Z]{4,}"),
        }
    })
}

/// Remove links, chat deep links, `@mentions` and "join our channel" phrases,
/// then collapse whitespace.
///
/// The pass sequence is repeated until the text stops changing: removing a
/// mention can splice its neighbours into a fresh link (`https@ab://x`), and
/// a second look catches that. Each pass only deletes or shrinks, so this
/// terminates.
pub fn strip(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut current = strip_pass(text);
    loop {
        let next = strip_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_pass(text: &str) -> String {
    let p = patterns();

    // Order matters: later patterns only see what survived the earlier ones.
    let mut out = p.http.replace_all(text, "").into_owned();
    out = p.www.replace_all(&out, "").into_owned();
    out = p.domain.replace_all(&out, "").into_owned();
    out = p.telegram_link.replace_all(&out, "").into_owned();
    out = p.tg_scheme.replace_all(&out, "").into_owned();
    out = p.mention.replace_all(&out, "").into_owned();
    out = p.join_phrase.replace_all(&out, "").into_owned();
    out = p.telegram_phrase.replace_all(&out, "").into_owned();

    collapse_whitespace(&out)
}

fn collapse_whitespace(text: &str) -> String {
    let p = patterns();
    let out = p.whitespace.replace_all(text, " ");
    let out = p.blank_lines.replace_all(&out, "\n");
    out.trim().to_string()
}

/// Tone down shouting: long emoji, punctuation and capital-letter runs are
/// cut to three, then whitespace is collapsed like [`strip`] does.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let p = patterns();
    let out = p.emoji_run.replace_all(text, "${1}${1}${1}");
    let out = p.exclaim_run.replace_all(&out, "!!!");
    let out = p.question_run.replace_all(&out, "???");
    let out = p.dot_run.replace_all(&out, "...");
    // ASCII-only class, byte slicing is safe.
    let out = p
        .caps_run
        .replace_all(&out, |caps: &Captures| caps[0][..3].to_string());

    collapse_whitespace(&out)
}

/// Before/after numbers for one processed message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub original_len: usize,
    pub processed_len: usize,
    pub links_removed: usize,
    pub mentions_removed: usize,
    pub reduction_percentage: f64,
}

impl ProcessingStats {
    pub fn measure(original: &str, processed: &str) -> Self {
        let p = patterns();
        let original_len = original.chars().count();
        let processed_len = processed.chars().count();
        let removed = original_len.saturating_sub(processed_len) as f64;
        let pct = removed / original_len.max(1) as f64 * 100.0;

        Self {
            original_len,
            processed_len,
            links_removed: p.http.find_iter(original).count(),
            mentions_removed: p.mention.find_iter(original).count(),
            reduction_percentage: (pct * 100.0).round() / 100.0,
        }
    }
}
