// src/config.rs

use crate::error::ConfigError;
use jsonwebtoken::Algorithm;
use std::env;
use std::time::Duration;
use url::Url;

const DEFAULT_GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_MODEL: &str = "llama-3.1-70b-versatile";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Settings applied when verifying a bearer token's signature and claims.
#[derive(Debug, Clone)]
pub struct ValidationDetails {
    /// The only signing algorithm accepted for bearer tokens.
    pub algorithm: Algorithm,
    /// The tolerance for clock skew when validating `exp` and `nbf`.
    /// Defaults to 60 seconds.
    pub leeway: Duration,
}

impl Default for ValidationDetails {
    fn default() -> Self {
        Self {
            // The auth provider signs access tokens with RS256.
            algorithm: Algorithm::RS256,
            leeway: Duration::from_secs(60),
        }
    }
}

/// Where the signing keys come from and how long a fetched set stays fresh.
#[derive(Debug, Clone)]
pub struct KeySetConfig {
    /// The JWKS endpoint. `None` is a deployment error reported when a token
    /// first needs a key, not at startup.
    pub jwks_uri: Option<Url>,
    /// How long a fetched key set is used before it is fetched again.
    pub freshness_window: Duration,
    /// Timeout for a single key set fetch.
    pub fetch_timeout: Duration,
}

impl Default for KeySetConfig {
    fn default() -> Self {
        Self {
            jwks_uri: None,
            freshness_window: Duration::from_secs(10 * 60),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Connection settings for the OpenAI-compatible completion service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: Url,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

/// Object storage credentials used to mint signed upload URLs.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub project_url: Url,
    pub service_role_key: String,
}

/// The complete service configuration. Construct it with [`ConfigBuilder`]
/// or [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub key_set: KeySetConfig,
    pub validation: ValidationDetails,
    pub llm: LlmConfig,
    pub storage: Option<StorageConfig>,
}

/// A builder for creating a `Config` instance.
#[derive(Default)]
pub struct ConfigBuilder {
    listen_addr: Option<String>,
    key_set: KeySetConfig,
    validation: ValidationDetails,
    llm_api_base: Option<Url>,
    llm_api_key: Option<String>,
    llm_model: Option<String>,
    llm_timeout: Option<Duration>,
    storage: Option<StorageConfig>,
}

fn parse_url(field: &'static str, url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address the HTTP server binds to. Defaults to `0.0.0.0:8000`.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Sets the JWKS endpoint of the auth provider.
    pub fn jwks_uri(mut self, url: &str) -> Result<Self, ConfigError> {
        self.key_set.jwks_uri = Some(parse_url("jwks_uri", url)?);
        Ok(self)
    }

    /// Sets how long a fetched key set is considered fresh. Defaults to 10 minutes.
    pub fn freshness_window(mut self, window: Duration) -> Self {
        self.key_set.freshness_window = window;
        self
    }

    /// Sets the timeout for a key set fetch. Defaults to 10 seconds.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.key_set.fetch_timeout = timeout;
        self
    }

    /// Sets the clock skew tolerance. Defaults to 60 seconds.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.validation.leeway = leeway;
        self
    }

    /// Sets the base URL of the completion API, e.g. `https://api.groq.com/openai/v1`.
    pub fn llm_api_base(mut self, url: &str) -> Result<Self, ConfigError> {
        self.llm_api_base = Some(parse_url("llm_api_base", url)?);
        Ok(self)
    }

    pub fn llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.llm_api_key = Some(key.into());
        self
    }

    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Sets the request timeout for completion calls. Defaults to 30 seconds.
    pub fn llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    /// Enables signed uploads against the given storage project.
    pub fn storage(mut self, project_url: &str, service_role_key: impl Into<String>) -> Result<Self, ConfigError> {
        self.storage = Some(StorageConfig {
            project_url: parse_url("storage_url", project_url)?,
            service_role_key: service_role_key.into(),
        });
        Ok(self)
    }

    /// Consumes the builder and returns a `Config` object.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration that must be positive is zero.
    pub fn build(self) -> Result<Config, ConfigError> {
        if self.key_set.freshness_window.is_zero() {
            return Err(ConfigError::InvalidConfiguration(
                "JWKS freshness window must be greater than 0".to_string(),
            ));
        }
        if self.key_set.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidConfiguration(
                "JWKS fetch timeout must be greater than 0".to_string(),
            ));
        }

        let llm_timeout = self.llm_timeout.unwrap_or(Duration::from_secs(30));
        if llm_timeout.is_zero() {
            return Err(ConfigError::InvalidConfiguration(
                "LLM timeout must be greater than 0".to_string(),
            ));
        }

        let api_base = match self.llm_api_base {
            Some(url) => url,
            None => parse_url("llm_api_base", DEFAULT_GROQ_API_BASE)?,
        };

        Ok(Config {
            listen_addr: self.listen_addr.unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            key_set: self.key_set,
            validation: self.validation,
            llm: LlmConfig {
                api_base,
                api_key: self.llm_api_key.filter(|k| !k.is_empty()),
                model: self.llm_model.unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
                timeout: llm_timeout,
            },
            storage: self.storage,
        })
    }
}

/// Reads an env var, treating an empty value the same as an unset one.
fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_secs(name: &str, default: u64) -> Result<Duration, ConfigError> {
    match env_opt(name) {
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidConfiguration(format!("{name} must be a whole number of seconds"))),
        None => Ok(Duration::from_secs(default)),
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// Missing JWKS or storage settings do not fail startup; the endpoints that
    /// need them answer with a server-misconfigured error instead.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::new()
            .freshness_window(env_secs("JWKS_CACHE_TTL_SECS", 10 * 60)?)
            .leeway(env_secs("JWT_LEEWAY_SECS", 60)?)
            .llm_timeout(env_secs("LLM_TIMEOUT_SECS", 30)?);

        if let Some(addr) = env_opt("LISTEN_ADDR") {
            builder = builder.listen_addr(addr);
        }
        if let Some(jwks) = env_opt("SUPABASE_JWKS_URL") {
            builder = builder.jwks_uri(&jwks)?;
        }
        if let Some(base) = env_opt("GROQ_API_BASE") {
            builder = builder.llm_api_base(&base)?;
        }
        if let Some(key) = env_opt("GROQ_API_KEY") {
            builder = builder.llm_api_key(key);
        }
        if let Some(model) = env_opt("GROQ_MODEL") {
            builder = builder.llm_model(model);
        }
        if let (Some(url), Some(key)) = (env_opt("SUPABASE_URL"), env_opt("SUPABASE_SERVICE_ROLE_KEY")) {
            builder = builder.storage(&url, key)?;
        }

        builder.build()
    }
}
