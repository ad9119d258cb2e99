use clap::Subcommand;
use quizfunnel_core::{FunnelConfig, RevealGate};
use serde_json::json;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum RevealAction {
    /// Whether the offer unlocks after this much watched video
    Check {
        /// Watched seconds
        #[arg(long)]
        watched: f64,
    },
    /// Processing banner state for this much watched video
    Banner {
        /// Watched seconds
        #[arg(long)]
        watched: f64,
    },
}

pub fn run(action: RevealAction) -> CliResult {
    let config = FunnelConfig::load_or_default();
    let mut gate = RevealGate::new(&config.reveal);

    match action {
        RevealAction::Check { watched } => {
            let revealed = gate.should_reveal(watched);
            print_json(&json!({
                "watched_secs": watched,
                "threshold_secs": gate.threshold_secs(),
                "revealed": revealed,
            }))
        }
        RevealAction::Banner { watched } => {
            gate.should_reveal(watched);
            let banner = gate.banner();
            print_json(&json!({
                "progress_pct": banner.progress_pct,
                "stage": banner.stage,
                "label": banner.stage.label(),
            }))
        }
    }
}
