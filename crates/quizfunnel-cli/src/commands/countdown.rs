use std::rc::Rc;

use clap::Subcommand;
use quizfunnel_core::{CountdownTimer, StorageKeys, SystemClock};
use serde_json::json;

use super::{open, print_json, CliResult};

#[derive(Subcommand)]
pub enum CountdownAction {
    /// Print the remaining offer time (starts the countdown on first use)
    Status,
    /// Forget the persisted start so the next read restarts it
    Reset,
}

pub fn run(action: CountdownAction) -> CliResult {
    let (config, store) = open()?;
    let keys = StorageKeys::new(config.quiz.key_prefix.clone());
    let mut countdown =
        CountdownTimer::new(store, Rc::new(SystemClock), &keys, config.countdown.duration_ms);

    if let CountdownAction::Reset = action {
        countdown.reset();
    }

    let start_ms = countdown.get_or_init_start();
    let remaining_ms = countdown.remaining_now();
    print_json(&json!({
        "start_ms": start_ms,
        "duration_ms": countdown.duration_ms(),
        "remaining_ms": remaining_ms,
        "display": quizfunnel_core::timer::format_mm_ss(remaining_ms),
        "expired": remaining_ms == 0,
    }))
}
