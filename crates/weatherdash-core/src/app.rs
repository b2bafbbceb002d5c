use anyhow::Result;

use crate::{Config, ValidationResult};

/// Application state and lifecycle manager
pub struct App {
    config: Config,
    validation: ValidationResult,
}

impl App {
    /// Create a new application instance from the on-disk configuration
    pub fn new() -> Result<Self> {
        let (config, validation) = Config::load_validated()?;
        Ok(Self::with_config(config, validation))
    }

    /// Create an application around an already loaded configuration
    pub fn with_config(config: Config, validation: ValidationResult) -> Self {
        tracing::info!(
            "Application configured from {} ({} warnings)",
            config.config_dir.display(),
            validation.warnings.len()
        );
        Self {
            config,
            validation,
        }
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Warnings produced while validating the config
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }
}
