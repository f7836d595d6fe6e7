/// # Retention block configuration
///
/// Everything the block needs from its deployment, read from a TOML file or
/// from the environment.
///
/// ```toml
/// [endpoint]
/// url_template = "https://retention.example.edu/users/{{user_name}}/course_sections.json"
/// timeout_ms = 1000
/// token_from = "RMS_API_TOKEN"
///
/// [site]
/// home_url = "https://lms.example.edu/"
/// pix_url = "https://lms.example.edu/pix/"
///
/// [response]
/// reject_malformed_body = false
/// ```
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::fetcher::UrlTemplate;

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://retention.midmich.edu/instructor/users/{{user_name}}/course_sections.json";
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

pub const ENV_URL_TEMPLATE: &str = "RETENTION_URL_TEMPLATE";
pub const ENV_API_TOKEN: &str = "RETENTION_API_TOKEN";
pub const ENV_TIMEOUT_MS: &str = "RETENTION_TIMEOUT_MS";
pub const ENV_HOME_URL: &str = "RETENTION_HOME_URL";
pub const ENV_PIX_URL: &str = "RETENTION_PIX_URL";
pub const ENV_REJECT_MALFORMED: &str = "RETENTION_REJECT_MALFORMED";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RetentionConfig {
    pub endpoint: Endpoint,
    pub site: Site,
    pub response: Response,
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url_template: String,
    pub token: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Site {
    /// Target of the fallback row when there is nothing to list
    pub home_url: String,
    /// Base URL icon identifiers are appended to
    pub pix_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Response {
    /// Surface unparseable bodies as an error row instead of an empty list
    pub reject_malformed_body: bool,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            token: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Default for Site {
    fn default() -> Self {
        Self {
            home_url: "/".to_string(),
            pix_url: "/pix/".to_string(),
        }
    }
}

impl Endpoint {
    /// Create an endpoint, resolving the token from an environment variable if needed
    pub fn new(
        url_template: String,
        token: Option<String>,
        token_from: Option<String>,
        timeout_ms: u64,
    ) -> Result<Self, ConfigError> {
        let token = match (token, token_from) {
            (Some(token), _) if !token.is_empty() => token,
            (_, Some(var)) => std::env::var(&var).map_err(|_| ConfigError::MissingToken(var))?,
            (token, None) => token.unwrap_or_default(),
        };

        Ok(Self {
            url_template,
            token,
            timeout_ms,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct EndpointRaw {
            url_template: Option<String>,
            token: Option<String>,
            token_from: Option<String>,
            timeout_ms: Option<u64>,
        }

        let raw = EndpointRaw::deserialize(deserializer)?;
        Endpoint::new(
            raw.url_template
                .unwrap_or_else(|| DEFAULT_URL_TEMPLATE.to_string()),
            raw.token,
            raw.token_from,
            raw.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        )
        .map_err(serde::de::Error::custom)
    }
}

impl RetentionConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading retention config from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Build configuration from `RETENTION_*` environment variables, reading
    /// a `.env` file first when one is present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(template) = std::env::var(ENV_URL_TEMPLATE) {
            config.endpoint.url_template = template;
        }
        if let Ok(token) = std::env::var(ENV_API_TOKEN) {
            config.endpoint.token = token;
        }
        if let Ok(timeout) = std::env::var(ENV_TIMEOUT_MS) {
            config.endpoint.timeout_ms = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_TIMEOUT_MS.to_string(), timeout))?;
        }
        if let Ok(home_url) = std::env::var(ENV_HOME_URL) {
            config.site.home_url = home_url;
        }
        if let Ok(pix_url) = std::env::var(ENV_PIX_URL) {
            config.site.pix_url = pix_url;
        }
        if let Ok(flag) = std::env::var(ENV_REJECT_MALFORMED) {
            config.response.reject_malformed_body = parse_flag(&flag)
                .ok_or_else(|| ConfigError::InvalidValue(ENV_REJECT_MALFORMED.to_string(), flag))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.token.is_empty() {
            return Err(ConfigError::MissingToken(
                "set endpoint.token or endpoint.token_from".to_string(),
            ));
        }
        if self.endpoint.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "endpoint.timeout_ms".to_string(),
                "0".to_string(),
            ));
        }
        UrlTemplate::parse(&self.endpoint.url_template)?;
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
