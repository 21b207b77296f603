use std::env;

use super::types::{ConfigError, Environment};

const DEFAULT_PAGE_SIZE_OPTIONS: &[usize] = &[5, 10, 25];

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn parse_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_page_size(field: &'static str, value: String) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

pub(super) fn parse_page_size_options(
    field: &'static str,
    value: Option<String>,
) -> Result<Vec<usize>, ConfigError> {
    let Some(raw) = value else {
        return Ok(DEFAULT_PAGE_SIZE_OPTIONS.to_vec());
    };

    let mut options = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_page_size(field, item.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    if options.is_empty() {
        return Ok(DEFAULT_PAGE_SIZE_OPTIONS.to_vec());
    }

    options.sort_unstable();
    options.dedup();
    Ok(options)
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

pub(super) fn parse_environment(value: Option<String>) -> Environment {
    match value.as_deref().map(|item| item.to_lowercase()) {
        Some(ref val) if val == "production" || val == "prod" => Environment::Production,
        Some(ref val) if val == "staging" => Environment::Staging,
        Some(ref val) if val == "test" || val == "testing" => Environment::Test,
        _ => Environment::Development,
    }
}
