use crate::services::providers::gemini::{
    GeminiConfig, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, GEMINI_API_BASE,
};
use service_core::config::{self as core_config, env_parsed, env_value};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// Default request body limit: one camera frame as base64 plus the prompt.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 4_718_592;

#[derive(Debug)]
pub struct ProxyConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub gemini: GeminiConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub body_limit_bytes: usize,
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl ProxyConfig {
    /// Load from the environment.
    ///
    /// A missing `GEMINI_API_KEY` is not an error here; `main` refuses to
    /// start without it and the handler reports it per request.
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = common.environment;

        let mut gemini = GeminiConfig::new(env::var("GEMINI_API_KEY").ok());
        gemini.model = env_value("GEMINI_MODEL", Some(DEFAULT_MODEL), environment)?;
        gemini.base_url = env_value("GEMINI_API_BASE", Some(GEMINI_API_BASE), environment)?;
        gemini.timeout = Duration::from_secs(env_parsed(
            "GEMINI_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
            environment,
        )?);

        let http = HttpConfig {
            body_limit_bytes: env_parsed(
                "PROXY_BODY_LIMIT_BYTES",
                DEFAULT_BODY_LIMIT_BYTES,
                environment,
            )?,
            allowed_origins: parse_origins(&env_value(
                "PROXY_ALLOWED_ORIGINS",
                Some("*"),
                environment,
            )?)?,
        };

        Ok(ProxyConfig {
            common,
            service_name: env_value("SERVICE_NAME", Some("capture-proxy"), environment)?,
            log_level: env_value("LOG_LEVEL", Some("info"), environment)?,
            gemini,
            http,
        })
    }

    /// The binary will not serve without a Gemini key.
    pub fn require_api_key(&self) -> Result<(), AppError> {
        if self.gemini.api_key.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GEMINI_API_KEY is required but not set"
            )));
        }
        Ok(())
    }
}

/// An empty list would silently block every cross-origin caller.
fn parse_origins(raw: &str) -> Result<Vec<String>, AppError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "PROXY_ALLOWED_ORIGINS must list at least one origin (use * for any)"
        )));
    }
    Ok(origins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example ,,").unwrap(),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn empty_origin_list_is_rejected() {
        for raw in ["", "  ", ",", " , ,"] {
            let err = parse_origins(raw).unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)), "{:?}", raw);
        }
    }

    #[test]
    fn api_key_is_required_to_serve() {
        let mut config = ProxyConfig {
            common: core_config::Config {
                port: 0,
                environment: core_config::Environment::Test,
            },
            service_name: "capture-proxy-test".to_string(),
            log_level: "info".to_string(),
            gemini: GeminiConfig::new(None),
            http: HttpConfig::default(),
        };

        let err = config.require_api_key().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        config.gemini = GeminiConfig::new(Some("k".to_string()));
        assert!(config.require_api_key().is_ok());
    }

    const LOAD_VARS: [&str; 6] = [
        "ENVIRONMENT",
        "GEMINI_API_KEY",
        "GEMINI_MODEL",
        "GEMINI_TIMEOUT_SECS",
        "PROXY_BODY_LIMIT_BYTES",
        "PROXY_ALLOWED_ORIGINS",
    ];

    // One test drives every `load` case: the variables are process-wide.
    #[test]
    fn load_reads_environment() {
        for key in LOAD_VARS {
            env::remove_var(key);
        }

        env::set_var("GEMINI_API_KEY", "   ");
        env::set_var("GEMINI_MODEL", "gemini-test");
        env::set_var("GEMINI_TIMEOUT_SECS", "7");
        env::set_var("PROXY_BODY_LIMIT_BYTES", "1024");
        env::set_var("PROXY_ALLOWED_ORIGINS", "https://a.example, https://b.example");

        let config = ProxyConfig::load().expect("config should load");
        assert!(config.gemini.api_key.is_none());
        assert!(config.require_api_key().is_err());
        assert_eq!(config.gemini.model, "gemini-test");
        assert_eq!(config.gemini.timeout, Duration::from_secs(7));
        assert_eq!(config.http.body_limit_bytes, 1024);
        assert_eq!(
            config.http.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );

        env::set_var("GEMINI_API_KEY", "real-key");
        assert!(ProxyConfig::load().unwrap().require_api_key().is_ok());

        env::set_var("PROXY_BODY_LIMIT_BYTES", "lots");
        let err = ProxyConfig::load().unwrap_err();
        assert!(err.to_string().contains("invalid value 'lots'"));
        env::set_var("PROXY_BODY_LIMIT_BYTES", "1024");

        env::set_var("PROXY_ALLOWED_ORIGINS", "");
        let err = ProxyConfig::load().unwrap_err();
        assert!(err.to_string().contains("PROXY_ALLOWED_ORIGINS"));
        env::set_var("PROXY_ALLOWED_ORIGINS", "*");

        env::set_var("ENVIRONMENT", "prod");
        env::remove_var("GEMINI_MODEL");
        let err = ProxyConfig::load().unwrap_err();
        assert!(err.to_string().contains("required in production"));

        for key in LOAD_VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn default_http_config_allows_any_origin() {
        let http = HttpConfig::default();
        assert_eq!(http.allowed_origins, vec!["*"]);
        assert_eq!(http.body_limit_bytes, DEFAULT_BODY_LIMIT_BYTES);
    }
}
