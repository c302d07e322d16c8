//! Environment overrides applied on top of [`Config::default`](super::Config).
//!
//! An unset variable leaves the target untouched; a set but unparsable one
//! is an [`ConfigError::EnvError`] naming the variable.

use std::str::FromStr;

use clap::ValueEnum;

use super::ConfigError;

pub fn var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Overwrite `target` with the raw value, for `String` and `Option<String>`.
pub fn override_text<T: From<String>>(name: &str, target: &mut T) {
    if let Some(value) = var(name) {
        *target = T::from(value);
    }
}

pub fn override_parsed<T>(name: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = var(name) {
        *target = value
            .trim()
            .parse()
            .map_err(|e| invalid(name, &value, e))?;
    }
    Ok(())
}

/// Enum values match their CLI names, ignoring case.
pub fn override_enum<T: ValueEnum>(name: &str, target: &mut T) -> Result<(), ConfigError> {
    if let Some(value) = var(name) {
        *target = <T as ValueEnum>::from_str(value.trim(), true).map_err(|e| invalid(name, &value, e))?;
    }
    Ok(())
}

fn invalid(name: &str, value: &str, error: impl std::fmt::Display) -> ConfigError {
    ConfigError::EnvError(format!("Invalid {name}={value:?}: {error}"))
}
