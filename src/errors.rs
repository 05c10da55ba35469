use crate::dispatcher::UpgradeCommand;
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("updater backend is no longer receiving commands: {} was dropped", _0)]
    BackendClosed(UpgradeCommand),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file at {:?}", path)]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid value for {}: {:?}", key, value)]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read scenario script")]
    Read(#[source] io::Error),

    #[error("line {}: not a valid event, action, or override", line)]
    Parse { line: usize, source: serde_json::Error },
}
