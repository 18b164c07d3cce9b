#![allow(clippy::result_large_err)]

use super::RunConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a decoded KCLRun after defaulting.
    pub fn validate(config: &RunConfig) -> Result<(), AppError> {
        if config.spec.source.trim().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "`source` must not be empty",
            )
            .with_code("KCL-CFG-003")
            .with_context("name", config.name.as_str()));
        }

        if config.name.trim().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "metadata.name must not be blank",
            )
            .with_code("KCL-CFG-003"));
        }

        Ok(())
    }
}
