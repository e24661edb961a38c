//! Small text helpers for admin replies (Telegram HTML).

use chrono::{DateTime, Utc};

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if days > 0 {
        return format!("{days}d {hours}h {mins}m {secs}s");
    }
    if hours > 0 {
        return format!("{hours}h {mins}m {secs}s");
    }
    if mins > 0 {
        return format!("{mins}m {secs}s");
    }
    format!("{secs}s")
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// "Never" for a missing timestamp.
pub fn format_optional_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(format_timestamp)
        .unwrap_or_else(|| "Never".to_string())
}

/// Cut to `max_chars` characters, marking the cut with "...".
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{kept}...")
}

/// Mask a secret for display, keeping just enough to recognize it.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.is_empty() {
        return "<empty>".to_string();
    }
    if chars.len() <= 8 {
        let first: String = chars.iter().take(2).collect();
        return format!("{first}***");
    }
    let first: String = chars[..4].iter().collect();
    let last: String = chars[chars.len() - 4..].iter().collect();
    format!("{first}***{last}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn escapes_html_specials() {
        assert_eq!(
            escape_html(r#"<b>"Tom & Jerry"</b>"#),
            "&lt;b&gt;&quot;Tom &amp; Jerry&quot;&lt;/b&gt;"
        );
    }

    #[rstest]
    #[case(-5, "0s")]
    #[case(0, "0s")]
    #[case(59, "59s")]
    #[case(61, "1m 1s")]
    #[case(3_661, "1h 1m 1s")]
    #[case(90_061, "1d 1h 1m 1s")]
    fn formats_durations(#[case] secs: i64, #[case] expected: &str) {
        assert_eq!(format_duration(secs), expected);
    }

    #[test]
    fn formats_timestamps() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-09 07:05:00 UTC");
        assert_eq!(format_optional_timestamp(None), "Never");
    }

    #[rstest]
    #[case("short", 10, "short")]
    #[case("exactly10!", 10, "exactly10!")]
    #[case("this is longer", 4, "this...")]
    #[case("ééééé", 2, "éé...")]
    fn truncates_on_char_boundaries(
        #[case] input: &str,
        #[case] max: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(truncate_chars(input, max), expected);
    }

    #[rstest]
    #[case("", "<empty>")]
    #[case("abcdef", "ab***")]
    #[case("123456:ABCDEFGHIJ", "1234***GHIJ")]
    fn masks_tokens(#[case] token: &str, #[case] expected: &str) {
        assert_eq!(mask_token(token), expected);
    }
}
