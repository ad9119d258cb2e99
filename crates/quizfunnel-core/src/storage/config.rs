//! TOML-based funnel configuration.
//!
//! Stores the tunables of the funnel:
//! - Quiz behavior (storage key prefix, auto-advance delay, back navigation)
//! - Loading animation timing and step mode
//! - Reveal gate threshold and banner ramp
//! - Countdown duration
//! - Video resume persistence cadence
//! - Static checkout links
//!
//! Configuration is stored at `~/.config/quizfunnel/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, ValidationError};

/// Quiz behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_auto_advance_delay_ms")]
    pub auto_advance_delay_ms: u64,
    #[serde(default)]
    pub allow_back: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingMode {
    /// Constant increment per tick.
    Fixed,
    /// Uniformly random increment in `[min_step, max_step]` per tick.
    Randomized,
}

/// Simulated "processing" animation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    #[serde(default = "default_loading_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_loading_tick_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_loading_mode")]
    pub mode: LoadingMode,
    #[serde(default = "default_loading_step")]
    pub step: u8,
    #[serde(default = "default_loading_min_step")]
    pub min_step: u8,
    #[serde(default = "default_loading_max_step")]
    pub max_step: u8,
    /// Seed for the randomized mode. A fresh seed is drawn when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealSource {
    /// Watched seconds reported by the video player.
    Video,
    /// Wall-clock seconds since the offer was mounted.
    Timer,
}

/// Reveal gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    #[serde(default = "default_reveal_source")]
    pub source: RevealSource,
    #[serde(default = "default_reveal_threshold_secs")]
    pub threshold_secs: f64,
    #[serde(default = "default_fast_ramp_secs")]
    pub fast_ramp_secs: f64,
    #[serde(default = "default_fast_ramp_pct")]
    pub fast_ramp_pct: f64,
}

/// Offer countdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_countdown_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_countdown_tick_ms")]
    pub tick_interval_ms: u64,
}

/// Video resume-position configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_save_every_secs")]
    pub save_every_secs: u64,
    #[serde(default = "default_progress_event_step_pct")]
    pub progress_event_step_pct: u8,
}

/// A static outbound checkout link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLink {
    pub id: String,
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Offer page configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferConfig {
    #[serde(default)]
    pub checkout: Vec<CheckoutLink>,
}

/// Funnel configuration.
///
/// Serialized to/from TOML at `~/.config/quizfunnel/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunnelConfig {
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub offer: OfferConfig,
}

// Default functions
fn default_key_prefix() -> String {
    "quizfunnel".into()
}
fn default_auto_advance_delay_ms() -> u64 {
    500
}
fn default_loading_duration_ms() -> u64 {
    5_000
}
fn default_loading_tick_ms() -> u64 {
    100
}
fn default_loading_mode() -> LoadingMode {
    LoadingMode::Fixed
}
fn default_loading_step() -> u8 {
    2
}
fn default_loading_min_step() -> u8 {
    1
}
fn default_loading_max_step() -> u8 {
    6
}
fn default_reveal_source() -> RevealSource {
    RevealSource::Video
}
fn default_reveal_threshold_secs() -> f64 {
    230.0
}
fn default_fast_ramp_secs() -> f64 {
    60.0
}
fn default_fast_ramp_pct() -> f64 {
    70.0
}
fn default_countdown_duration_ms() -> u64 {
    20 * 60 * 1000
}
fn default_countdown_tick_ms() -> u64 {
    1_000
}
fn default_save_every_secs() -> u64 {
    4
}
fn default_progress_event_step_pct() -> u8 {
    10
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            auto_advance_delay_ms: default_auto_advance_delay_ms(),
            allow_back: false,
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_loading_duration_ms(),
            tick_interval_ms: default_loading_tick_ms(),
            mode: default_loading_mode(),
            step: default_loading_step(),
            min_step: default_loading_min_step(),
            max_step: default_loading_max_step(),
            seed: None,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            source: default_reveal_source(),
            threshold_secs: default_reveal_threshold_secs(),
            fast_ramp_secs: default_fast_ramp_secs(),
            fast_ramp_pct: default_fast_ramp_pct(),
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_countdown_duration_ms(),
            tick_interval_ms: default_countdown_tick_ms(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            save_every_secs: default_save_every_secs(),
            progress_event_step_pct: default_progress_event_step_pct(),
        }
    }
}

impl FunnelConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional fields serialize as null; accept numbers or strings.
                    serde_json::Value::Null => {
                        if value.is_empty() || value == "none" {
                            serde_json::Value::Null
                        } else if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            serde_json::Value::String(value.into())
                        }
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if no file exists.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: FunnelConfig =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("falling back to default config: {e}");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting.
    ///
    /// The updated tree must still deserialize and validate.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: FunnelConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |field: &str, message: &str| ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.to_string(),
        };

        if self.quiz.key_prefix.is_empty() {
            return Err(invalid("quiz.key_prefix", "must not be empty"));
        }
        if !(300..=500).contains(&self.quiz.auto_advance_delay_ms) {
            return Err(invalid(
                "quiz.auto_advance_delay_ms",
                "must be between 300 and 500",
            ));
        }
        if self.loading.tick_interval_ms == 0 || self.loading.duration_ms == 0 {
            return Err(invalid("loading", "durations must be positive"));
        }
        if self.loading.step == 0 {
            return Err(invalid("loading.step", "must be positive"));
        }
        if self.loading.min_step == 0 || self.loading.min_step > self.loading.max_step {
            return Err(invalid(
                "loading.min_step",
                "must be positive and not above loading.max_step",
            ));
        }
        if !self.reveal.threshold_secs.is_finite() || self.reveal.threshold_secs < 0.0 {
            return Err(invalid("reveal.threshold_secs", "must be a non-negative number"));
        }
        if !(0.0..=100.0).contains(&self.reveal.fast_ramp_pct) {
            return Err(invalid("reveal.fast_ramp_pct", "must be within 0..=100"));
        }
        if !self.reveal.fast_ramp_secs.is_finite() || self.reveal.fast_ramp_secs < 0.0 {
            return Err(invalid("reveal.fast_ramp_secs", "must be a non-negative number"));
        }
        if self.countdown.tick_interval_ms == 0 {
            return Err(invalid("countdown.tick_interval_ms", "must be positive"));
        }
        if self.playback.save_every_secs == 0 {
            return Err(invalid("playback.save_every_secs", "must be positive"));
        }
        for link in &self.offer.checkout {
            url::Url::parse(&link.url).map_err(|e| ValidationError::InvalidCheckoutUrl {
                id: link.id.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}
