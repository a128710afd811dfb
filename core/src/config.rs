//! Stack configuration.
//!
//! A `StackConfig` is built once (from code, from a deserialized settings
//! file, or from the environment) and handed to [`crate::Stack::new`], which
//! shares it with every builder it creates. There is no process-wide
//! instance.

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_PROTOCOL: &str = "https";
pub const DEFAULT_HOST: &str = "cdn.contentstack.io";
pub const DEFAULT_VERSION: &str = "v3";

/// Connection settings and static credentials for one stack.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StackConfig {
    pub api_key: String,
    pub delivery_token: String,
    pub environment: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub branch: Option<String>,
    /// Early-access feature flags, sent comma-joined in `x-header-ea`.
    #[serde(default)]
    pub early_access: Vec<String>,
    /// Extra static headers sent with every request.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl StackConfig {
    pub fn new(
        api_key: impl Into<String>,
        delivery_token: impl Into<String>,
        environment: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            api_key: api_key.into(),
            delivery_token: delivery_token.into(),
            environment: environment.into(),
            protocol: default_protocol(),
            host: default_host(),
            version: default_version(),
            branch: None,
            early_access: Vec::new(),
            headers: Vec::new(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `CDN_API_KEY`, `CDN_DELIVERY_TOKEN`, `CDN_ENVIRONMENT`, and
    /// the optional `CDN_HOST`, `CDN_PROTOCOL`, `CDN_BRANCH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            std::env::var(name).map_err(|_| ConfigError::MissingEnv(name))
        };
        let mut config = Self::new(
            required("CDN_API_KEY")?,
            required("CDN_DELIVERY_TOKEN")?,
            required("CDN_ENVIRONMENT")?,
        )?;
        if let Ok(host) = std::env::var("CDN_HOST") {
            config.host = host;
        }
        if let Ok(protocol) = std::env::var("CDN_PROTOCOL") {
            config.protocol = protocol;
        }
        config.branch = std::env::var("CDN_BRANCH").ok();
        debug!(host = %config.host, environment = %config.environment, "loaded stack config from env");
        Ok(config)
    }

    /// Reject configurations missing a credential or identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.delivery_token.trim().is_empty() {
            return Err(ConfigError::Missing("delivery_token"));
        }
        if self.environment.trim().is_empty() {
            return Err(ConfigError::Missing("environment"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        Ok(())
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_early_access(mut self, features: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.early_access = features.into_iter().map(Into::into).collect();
        self
    }

    /// Add a static header. A name already set, compared case-insensitively,
    /// is replaced; this includes `api_key` and `access_token`.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
        self.headers.push((key, value.into()));
        self
    }

    /// `{protocol}://{host}/{version}` with no trailing slash.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}/{}",
            self.protocol,
            self.host.trim_end_matches('/'),
            self.version.trim_matches('/')
        )
    }

    /// Static headers attached to every request.
    pub(crate) fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("api_key".to_string(), self.api_key.clone()),
            ("access_token".to_string(), self.delivery_token.clone()),
        ];
        if let Some(branch) = &self.branch {
            headers.push(("branch".to_string(), branch.clone()));
        }
        if !self.early_access.is_empty() {
            headers.push(("x-header-ea".to_string(), self.early_access.join(",")));
        }
        headers.push((
            "x-user-agent".to_string(),
            format!("cdn-core/{}", env!("CARGO_PKG_VERSION")),
        ));
        headers.extend(self.headers.iter().cloned());
        headers
    }
}
