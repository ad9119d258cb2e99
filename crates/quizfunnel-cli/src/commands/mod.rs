pub mod config;
pub mod countdown;
pub mod quiz;
pub mod reveal;

use std::rc::Rc;

use quizfunnel_core::{FunnelConfig, KeyValueStore, SqliteStore};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Config plus the on-disk store every stateful command works against.
pub fn open() -> CliResult<(FunnelConfig, Rc<dyn KeyValueStore>)> {
    let config = FunnelConfig::load()?;
    let store: Rc<dyn KeyValueStore> = Rc::new(SqliteStore::open()?);
    tracing::debug!(prefix = %config.quiz.key_prefix, "store opened");
    Ok((config, store))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
