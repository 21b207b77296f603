use std::{fs, path::Path};

use super::parsing::env_optional;
use super::types::ConfigError;

/// Resolves the bearer token: the variable wins, then the token file.
pub(super) fn load_token(
    token_var: &'static str,
    file_var: &'static str,
) -> Result<Option<String>, ConfigError> {
    if let Some(token) = env_optional(token_var) {
        return Ok(Some(token));
    }

    match env_optional(file_var) {
        Some(path) => read_token_file(file_var, Path::new(&path)),
        None => Ok(None),
    }
}

fn read_token_file(field: &'static str, path: &Path) -> Result<Option<String>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        field,
        path: path.display().to_string(),
        source,
    })?;

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!(path = %path.display(), "Token file is empty; continuing without a session");
        return Ok(None);
    }

    Ok(Some(trimmed.to_string()))
}
