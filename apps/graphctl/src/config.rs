//! Layered application configuration.
//!
//! Precedence, lowest first: built-in defaults, YAML file, `GRAPHCTL__*`
//! environment variables, command-line flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use graph_directory_plugin::GraphConfig;
use graphctl_oauth::{ClientAuthMethod, DEFAULT_SCOPE, SecretString};
use identity_resolver::ResolverConfig;
use identity_resolver_sdk::Strategy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use url::Url;

/// Read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "graphctl.yaml";

/// `GRAPHCTL__AUTH__CLIENT_ID` sets `auth.client_id`.
pub const ENV_PREFIX: &str = "GRAPHCTL__";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

pub const MAX_RESULTS_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to render configuration: {0}")]
    Render(String),
}

/// What the configuration is about to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Check,
    Resolve,
    Invite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub graph: GraphConfig,
    pub search: SearchConfig,
    pub resolver: ResolverConfig,
    pub invite: InviteConfig,
    pub logging: LoggingConfig,
}

/// App registration credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub tenant_id: String,
    pub client_id: String,
    /// Printed as `[REDACTED]`.
    pub client_secret: SecretString,
    pub authority_host: String,
    /// Space-separated scopes.
    pub scope: String,
    /// Overrides `{authority_host}/{tenant_id}/oauth2/v2.0/token`.
    pub token_endpoint: Option<String>,
    pub auth_method: ClientAuthMethod,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: SecretString::default(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_owned(),
            scope: DEFAULT_SCOPE.to_owned(),
            token_endpoint: None,
            auth_method: ClientAuthMethod::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub strategy: Strategy,
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            max_results: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InviteConfig {
    /// Where the guest lands after redeeming. Required for `invite`.
    pub redirect_url: Option<String>,
    pub send_invitation_message: bool,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            redirect_url: None,
            send_invitation_message: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level of the stderr layer; `-v` flags and `RUST_LOG` override it.
    pub console_level: String,
    pub file_level: String,
    pub dir: PathBuf,
    /// Log file name inside `dir`. Empty disables file logging.
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: "warn".to_owned(),
            file_level: "info".to_owned(),
            dir: PathBuf::from("log"),
            file: "graphctl.log".to_owned(),
        }
    }
}

impl AppConfig {
    /// Load defaults, then `path` (or `./graphctl.yaml` when present), then
    /// the environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingFile`] if `path` is given but absent,
    /// [`ConfigError::Load`] on unparseable YAML, unknown keys or bad values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::MissingFile(path.to_path_buf()));
                }
                figment = figment.merge(Yaml::file(path));
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    figment = figment.merge(Yaml::file(default));
                }
            }
        }

        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        tracing::debug!(file = ?path, "configuration loaded");
        Ok(config)
    }

    /// Check the settings `purpose` depends on. All problems are reported
    /// together.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] listing every problem found.
    pub fn validate(&self, purpose: Purpose) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        let auth = &self.auth;

        if auth.token_endpoint.is_none() && auth.tenant_id.trim().is_empty() {
            problems.push("auth.tenant_id must be set".to_owned());
        }
        if auth.client_id.trim().is_empty() {
            problems.push("auth.client_id must be set".to_owned());
        }
        if auth.client_secret.is_empty() {
            problems.push("auth.client_secret must be set".to_owned());
        }
        if let Some(endpoint) = &auth.token_endpoint
            && !is_http_url(endpoint)
        {
            problems.push(format!(
                "auth.token_endpoint must be an absolute http(s) URL (got '{endpoint}')"
            ));
        }
        if !is_http_url(&self.graph.base_url) {
            problems.push(format!(
                "graph.base_url must be an absolute http(s) URL (got '{}')",
                self.graph.base_url
            ));
        }
        if !MAX_RESULTS_RANGE.contains(&self.search.max_results) {
            problems.push(format!(
                "search.max_results must be between {} and {} (got {})",
                MAX_RESULTS_RANGE.start(),
                MAX_RESULTS_RANGE.end(),
                self.search.max_results
            ));
        }
        match (&self.invite.redirect_url, purpose) {
            (None, Purpose::Invite) => {
                problems.push("invite.redirect_url must be set to send invitations".to_owned());
            }
            (Some(url), _) if Url::parse(url).is_err() => {
                problems.push(format!(
                    "invite.redirect_url must be an absolute URL (got '{url}')"
                ));
            }
            _ => {}
        }
        for (key, level) in [
            ("logging.console_level", &self.logging.console_level),
            ("logging.file_level", &self.logging.file_level),
        ] {
            if LevelFilter::from_str(level).is_err() {
                problems.push(format!("{key} is not a log level (got '{level}')"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    /// Effective configuration as pretty JSON, secret redacted.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Render`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Render(e.to_string()))
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && !u.cannot_be_a_base())
}
