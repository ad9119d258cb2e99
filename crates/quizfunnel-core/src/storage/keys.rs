use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Namespaced storage keys for every persisted funnel value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: String,
}

impl StorageKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn quiz_step(&self) -> String {
        self.key("quiz-step")
    }

    pub fn quiz_answers(&self) -> String {
        self.key("quiz-answers")
    }

    pub fn quiz_loading(&self) -> String {
        self.key("quiz-loading")
    }

    pub fn countdown_start(&self) -> String {
        self.key("offer-countdown-start")
    }

    pub fn utm_params(&self) -> String {
        self.key("utm-params")
    }

    pub fn lead_id(&self) -> String {
        self.key("lead-id")
    }

    /// Resume-position key for one video source.
    ///
    /// The suffix is the first 20 characters of the base64-encoded source.
    pub fn player_time(&self, source: &str) -> String {
        let encoded = STANDARD.encode(source.as_bytes());
        let hash: String = encoded.chars().take(20).collect();
        self.key(&format!("player-time-{hash}"))
    }

    fn key(&self, name: &str) -> String {
        format!("{}-{name}", self.prefix)
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new("quizfunnel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed() {
        let keys = StorageKeys::new("planofit");
        assert_eq!(keys.quiz_step(), "planofit-quiz-step");
        assert_eq!(keys.quiz_answers(), "planofit-quiz-answers");
        assert_eq!(keys.quiz_loading(), "planofit-quiz-loading");
        assert_eq!(keys.countdown_start(), "planofit-offer-countdown-start");
    }

    #[test]
    fn player_time_key_uses_truncated_base64() {
        let keys = StorageKeys::default();
        // base64("https://video.example/main.m3u8") starts with "aHR0cHM6Ly92aWRlby5l"
        assert_eq!(
            keys.player_time("https://video.example/main.m3u8"),
            "quizfunnel-player-time-aHR0cHM6Ly92aWRlby5l"
        );
    }

    #[test]
    fn distinct_sources_get_distinct_keys() {
        let keys = StorageKeys::default();
        assert_ne!(keys.player_time("a.m3u8"), keys.player_time("b.m3u8"));
    }
}
