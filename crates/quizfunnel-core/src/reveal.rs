//! Offer reveal gate and the "processing" banner shown while it is closed.
//!
//! The gate latches: once the watched time reaches the threshold the offer
//! stays visible for the session, even if the player later reports a lower
//! time (replay, seek back).

use serde::{Deserialize, Serialize};

use crate::storage::RevealConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerStage {
    InitialAnalysis,
    Discoveries,
    Personalization,
    FinalTouches,
}

impl BannerStage {
    pub fn label(self) -> &'static str {
        match self {
            Self::InitialAnalysis => "Initial analysis",
            Self::Discoveries => "Discoveries",
            Self::Personalization => "Personalization",
            Self::FinalTouches => "Final touches",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingBanner {
    pub progress_pct: f64,
    pub stage: BannerStage,
}

#[derive(Debug, Clone)]
pub struct RevealGate {
    threshold_secs: f64,
    fast_ramp_secs: f64,
    fast_ramp_pct: f64,
    revealed: bool,
    max_watched_secs: f64,
}

impl RevealGate {
    pub fn new(config: &RevealConfig) -> Self {
        Self {
            threshold_secs: config.threshold_secs.max(0.0),
            fast_ramp_secs: config.fast_ramp_secs.max(0.0),
            fast_ramp_pct: config.fast_ramp_pct.clamp(0.0, 100.0),
            revealed: false,
            max_watched_secs: 0.0,
        }
    }

    pub fn with_threshold(threshold_secs: f64) -> Self {
        Self::new(&RevealConfig {
            threshold_secs,
            ..RevealConfig::default()
        })
    }

    pub fn threshold_secs(&self) -> f64 {
        self.threshold_secs
    }

    /// Feed the latest watched time; returns whether the offer is visible.
    pub fn should_reveal(&mut self, watched_secs: f64) -> bool {
        if watched_secs.is_finite() && watched_secs > self.max_watched_secs {
            self.max_watched_secs = watched_secs;
        }
        if !self.revealed && self.max_watched_secs >= self.threshold_secs {
            tracing::debug!(watched_secs = self.max_watched_secs, "offer revealed");
            self.revealed = true;
        }
        self.revealed
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Highest watched time seen this session.
    pub fn max_watched_secs(&self) -> f64 {
        self.max_watched_secs
    }

    /// Banner state for the highest watched time seen, so it never regresses.
    pub fn banner(&self) -> ProcessingBanner {
        let watched = self.max_watched_secs;
        let stage_len = self.fast_ramp_secs;
        let stage = if watched < stage_len {
            BannerStage::InitialAnalysis
        } else if watched < stage_len * 2.0 {
            BannerStage::Discoveries
        } else if watched < stage_len * 3.0 {
            BannerStage::Personalization
        } else {
            BannerStage::FinalTouches
        };
        ProcessingBanner {
            progress_pct: processing_progress(
                watched,
                self.threshold_secs,
                self.fast_ramp_secs,
                self.fast_ramp_pct,
            ),
            stage,
        }
    }
}

/// Two-segment ramp: `fast_pct` over the first `fast_secs`, then the rest
/// of the way to 100 at `threshold_secs`. Saturates at 100.
pub fn processing_progress(watched_secs: f64, threshold_secs: f64, fast_secs: f64, fast_pct: f64) -> f64 {
    let watched = if watched_secs.is_finite() { watched_secs.max(0.0) } else { 0.0 };
    if threshold_secs <= 0.0 || watched >= threshold_secs {
        return 100.0;
    }
    let fast_secs = fast_secs.min(threshold_secs);
    let pct = if watched < fast_secs {
        watched / fast_secs * fast_pct
    } else {
        fast_pct + (watched - fast_secs) / (threshold_secs - fast_secs) * (100.0 - fast_pct)
    };
    pct.min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn reveals_at_threshold() {
        let mut gate = RevealGate::with_threshold(230.0);
        assert!(!gate.should_reveal(0.0));
        assert!(!gate.should_reveal(229.9));
        assert!(gate.should_reveal(230.0));
    }

    #[test]
    fn latch_survives_replay() {
        let mut gate = RevealGate::with_threshold(1.0);
        assert!(gate.should_reveal(1.5));
        assert!(gate.should_reveal(0.0));
        assert!(gate.is_revealed());
    }

    #[test]
    fn ignores_non_finite_input() {
        let mut gate = RevealGate::with_threshold(10.0);
        assert!(!gate.should_reveal(f64::NAN));
        assert!(!gate.should_reveal(f64::INFINITY));
        assert_eq!(gate.max_watched_secs(), 0.0);
    }

    #[test]
    fn banner_ramp_matches_segments() {
        assert!(approx(processing_progress(0.0, 230.0, 60.0, 70.0), 0.0));
        assert!(approx(processing_progress(30.0, 230.0, 60.0, 70.0), 35.0));
        assert!(approx(processing_progress(60.0, 230.0, 60.0, 70.0), 70.0));
        assert!(approx(processing_progress(145.0, 230.0, 60.0, 70.0), 85.0));
        assert!(approx(processing_progress(230.0, 230.0, 60.0, 70.0), 100.0));
        assert!(approx(processing_progress(999.0, 230.0, 60.0, 70.0), 100.0));
    }

    #[test]
    fn banner_handles_short_thresholds() {
        // Fast ramp longer than the threshold collapses into a single ramp.
        assert!(approx(processing_progress(0.5, 1.0, 60.0, 70.0), 35.0));
        assert!(approx(processing_progress(0.0, 0.0, 60.0, 70.0), 100.0));
    }

    #[test]
    fn banner_never_regresses() {
        let mut gate = RevealGate::with_threshold(230.0);
        gate.should_reveal(120.0);
        let before = gate.banner();
        gate.should_reveal(10.0);
        assert_eq!(gate.banner(), before);
        assert_eq!(before.stage, BannerStage::Personalization);
    }
}
