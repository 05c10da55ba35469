use crate::{errors::ConfigError, CONFIG_FILE};
use envfile::EnvFile;
use log::LevelFilter;
use std::{env, path::Path};

const NEVER_AUTO_LAUNCH: &str = "NEVER_AUTO_LAUNCH";
const LOG_LEVEL: &str = "LOG_LEVEL";

const ENV_NEVER_AUTO_LAUNCH: &str = "APP_UPGRADE_NEVER_AUTO_LAUNCH";
const ENV_LOG_LEVEL: &str = "APP_UPGRADE_LOG";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Verified installers wait for the user instead of being launched by the backend.
    pub never_auto_launch: bool,
    pub log_level:         LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self { never_auto_launch: cfg!(target_os = "linux"), log_level: LevelFilter::Info }
    }
}

impl Config {
    /// Reads the system configuration file, and then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(Path::new(CONFIG_FILE))?;
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a `KEY=value` file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if !path.exists() {
            debug!("no configuration at {}: using defaults", path.display());
            return Ok(config);
        }

        let file = EnvFile::new(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        if let Some(value) = file.get(NEVER_AUTO_LAUNCH) {
            config.set(NEVER_AUTO_LAUNCH, &value.to_string())?;
        }

        if let Some(value) = file.get(LOG_LEVEL) {
            config.set(LOG_LEVEL, &value.to_string())?;
        }

        Ok(config)
    }

    /// Applies overrides from environment variables, as resolved by `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(value) = var(ENV_NEVER_AUTO_LAUNCH) {
            self.set(NEVER_AUTO_LAUNCH, &value)?;
        }

        if let Some(value) = var(ENV_LOG_LEVEL) {
            self.set(LOG_LEVEL, &value)?;
        }

        Ok(())
    }

    fn set(&mut self, key: &'static str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue { key, value: value.to_owned() };

        match key {
            NEVER_AUTO_LAUNCH => self.never_auto_launch = parse_flag(value).ok_or_else(invalid)?,
            LOG_LEVEL => self.log_level = value.trim().parse().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        }

        Ok(())
    }
}

fn parse_flag(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "1" | "y" | "yes" | "true" | "on" => Some(true),
        "0" | "n" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
