use crate::state::ForwardConfig;

const ELLIPSIS: &str = "...";

/// Build the outgoing text: truncated body, blank line, reference trailer.
///
/// Only the body is bounded by `max_message_length`; the trailer is appended
/// after truncation, so the total can run past the limit.
pub fn compose(body: &str, cfg: &ForwardConfig) -> String {
    let body = truncate_body(body, cfg.max_message_length);
    if body.is_empty() {
        return cfg.reference_text.clone();
    }
    format!("{body}\n\n{}", cfg.reference_text)
}

fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = body.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max: usize) -> ForwardConfig {
        ForwardConfig {
            max_message_length: max,
            ..ForwardConfig::default()
        }
    }

    #[test]
    fn empty_body_yields_reference_only() {
        let cfg = cfg(4000);
        assert_eq!(compose("", &cfg), cfg.reference_text);
    }

    #[test]
    fn appends_reference_after_blank_line() {
        let cfg = cfg(4000);
        assert_eq!(
            compose("Check this", &cfg),
            format!("Check this\n\n{}", cfg.reference_text)
        );
    }

    #[test]
    fn body_at_limit_is_untouched() {
        let cfg = cfg(20);
        let body = "x".repeat(20);
        assert_eq!(compose(&body, &cfg), format!("{body}\n\n{}", cfg.reference_text));
    }

    #[test]
    fn body_over_limit_is_cut_with_ellipsis() {
        let cfg = cfg(20);
        let body = "y".repeat(21);
        let out = compose(&body, &cfg);
        let expected_body = format!("{}...", "y".repeat(17));
        assert_eq!(out, format!("{expected_body}\n\n{}", cfg.reference_text));
        assert_eq!(expected_body.chars().count(), 20);
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let cfg = cfg(5);
        let out = compose("привет мир", &cfg);
        assert!(out.starts_with("пр...\n\n"));
    }

    #[test]
    fn trailer_may_push_total_past_limit() {
        let cfg = cfg(10);
        let out = compose(&"z".repeat(10), &cfg);
        assert!(out.chars().count() > 10);
    }
}
