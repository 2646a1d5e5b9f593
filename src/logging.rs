//! Tracing setup and log helpers

use tracing_subscriber::EnvFilter;

/// Maximum number of prompt characters written to the log
pub const PROMPT_PREVIEW_CHARS: usize = 50;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_level` when it is set and valid.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // Fails only when a global subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Shorten user text for log lines
pub fn preview(text: &str) -> String {
    if text.chars().count() <= PROMPT_PREVIEW_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PROMPT_PREVIEW_CHARS).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("hello"), "hello");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let prompt = "a".repeat(80);
        let shown = preview(&prompt);
        assert_eq!(shown.len(), 53);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let prompt = "é".repeat(60);
        let shown = preview(&prompt);
        assert_eq!(shown.chars().count(), 53);
    }
}
