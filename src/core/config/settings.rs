use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_environment, parse_page_size,
    parse_page_size_options, parse_u64,
};
use super::secret::load_token;
use super::types::{
    parse_base_url, ApiSettings, AuthSettings, ConfigError, DownloadPath, DownloadSettings,
    PagingSettings, RuntimeSettings, Settings, TelemetrySettings,
};
use crate::schemas::pagination::MAX_PAGE_LIMIT;

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let environment =
            parse_environment(env_optional("HISTORY_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("HISTORY_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let base_url =
            parse_base_url(env_or_default("HISTORY_API_BASE_URL", "http://localhost:8000"))?;
        let request_timeout_seconds = parse_u64(
            "HISTORY_REQUEST_TIMEOUT_SECONDS",
            env_or_default("HISTORY_REQUEST_TIMEOUT_SECONDS", "30"),
        )?;
        let download_path = match env_optional("HISTORY_DOWNLOAD_PATH") {
            Some(raw) => DownloadPath::parse(raw)?,
            None => DownloadPath::default(),
        };

        let token = load_token("HISTORY_API_TOKEN", "HISTORY_TOKEN_FILE")?;

        let directory = env_or_default("HISTORY_DOWNLOAD_DIR", "downloads");

        let page_size =
            parse_page_size("HISTORY_PAGE_SIZE", env_or_default("HISTORY_PAGE_SIZE", "10"))?;
        let page_size_options = parse_page_size_options(
            "HISTORY_PAGE_SIZE_OPTIONS",
            env_optional("HISTORY_PAGE_SIZE_OPTIONS"),
        )?;

        let log_level = env_or_default("HISTORY_LOG_LEVEL", "info");
        let json =
            env_optional("HISTORY_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { base_url, request_timeout_seconds, download_path },
            auth: AuthSettings { token },
            downloads: DownloadSettings { directory },
            paging: PagingSettings { page_size, page_size_options },
            telemetry: TelemetrySettings { log_level, json },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn auth(&self) -> &AuthSettings {
        &self.auth
    }

    pub(crate) fn downloads(&self) -> &DownloadSettings {
        &self.downloads
    }

    pub(crate) fn paging(&self) -> &PagingSettings {
        &self.paging
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "HISTORY_REQUEST_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.downloads.directory.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "HISTORY_DOWNLOAD_DIR",
                value: String::from("<empty>"),
            });
        }

        if let Some(too_large) = self
            .paging
            .page_size_options
            .iter()
            .find(|size| **size > MAX_PAGE_LIMIT as usize)
        {
            return Err(ConfigError::InvalidValue {
                field: "HISTORY_PAGE_SIZE_OPTIONS",
                value: too_large.to_string(),
            });
        }

        if !self.paging.page_size_options.contains(&self.paging.page_size) {
            return Err(ConfigError::InvalidValue {
                field: "HISTORY_PAGE_SIZE",
                value: self.paging.page_size.to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.auth.token.is_none() {
            return Err(ConfigError::MissingSecret("HISTORY_API_TOKEN/HISTORY_TOKEN_FILE"));
        }

        Ok(())
    }
}
