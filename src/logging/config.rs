use crate::logging::layers::console::ConsoleOutput;
use crate::Result;
use anyhow::anyhow;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

pub const LOG_LEVEL_ENV: &str = "KRM_KCL_LOG_LEVEL";
pub const LOG_CONSOLE_ENV: &str = "KRM_KCL_LOG_CONSOLE";
pub const LOG_DIR_ENV: &str = "KRM_KCL_LOG_DIR";

const DEFAULT_LEVEL: &str = "info";

/// Resolved logging configuration after env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Enables the file sink when set.
    pub log_dir: Option<PathBuf>,
    pub default_level: String,
    pub console_output: Option<ConsoleOutput>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_level: DEFAULT_LEVEL.to_string(),
            console_output: None,
        }
    }
}

impl LoggingConfig {
    /// Load configuration with deterministic precedence: defaults, then env overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(|key| env::var(key).ok())
    }

    pub fn load_from<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LoggingConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(level) = non_empty(LOG_LEVEL_ENV) {
            config.default_level = level.trim().to_string();
        }
        if let Some(console) = non_empty(LOG_CONSOLE_ENV) {
            config.console_output = Some(ConsoleOutput::from_str(&console).map_err(|e| anyhow!(e))?);
        }
        if let Some(dir) = non_empty(LOG_DIR_ENV) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        Directive::from_str(&self.default_level)
            .map_err(|_| anyhow!("{} must be a valid tracing directive", LOG_LEVEL_ENV))?;
        Ok(())
    }
}
