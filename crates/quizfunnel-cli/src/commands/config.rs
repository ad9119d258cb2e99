use clap::Subcommand;
use quizfunnel_core::FunnelConfig;
use serde_json::json;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value (e.g. "reveal.threshold_secs", "quiz.allow_back")
    Get {
        /// Dot-separated key; a section name prints the whole section
        key: String,
    },
    /// Change one value; rejected if the result fails validation
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// Print the config file location and its contents
    List,
    /// Validate the config file as written on disk
    Check,
    /// Overwrite the config file with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = FunnelConfig::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = FunnelConfig::load()?;
            let previous = config.get(&key);
            config.set(&key, &value)?;
            tracing::debug!(%key, "config updated");
            print_json(&json!({
                "key": key,
                "previous": previous,
                "value": config.get(&key),
            }))?;
        }
        ConfigAction::List => {
            let config = FunnelConfig::load()?;
            print_json(&json!({
                "path": FunnelConfig::path()?,
                "config": config,
            }))?;
        }
        ConfigAction::Check => {
            // Hand edits bypass `set`, so the file may hold values `set` rejects.
            let config = FunnelConfig::load()?;
            let result = config.validate();
            print_json(&json!({
                "path": FunnelConfig::path()?,
                "valid": result.is_ok(),
                "error": result.as_ref().err().map(ToString::to_string),
                "checkout_links": config.offer.checkout.len(),
                "reveal_source": config.reveal.source,
            }))?;
            result?;
        }
        ConfigAction::Reset => {
            let config = FunnelConfig::default();
            config.save()?;
            print_json(&json!({
                "path": FunnelConfig::path()?,
                "config": config,
            }))?;
        }
    }
    Ok(())
}
