//! Configuration for the Graph directory plugin.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Root of the Graph API, including the version segment.
    pub base_url: String,

    /// Timeout of a single HTTP request.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Retries after the first attempt for idempotent requests.
    pub max_retries: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = GraphConfig::default();
        assert_eq!(cfg.base_url, "https://graph.microsoft.com/v1.0");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_retries, 3);
    }

    #[test]
    fn reads_humantime_timeout_and_fills_defaults() {
        let cfg: GraphConfig = serde_json::from_str(r#"{"timeout":"1m 30s"}"#).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(90));
        assert_eq!(cfg.max_retries, 3);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = serde_json::from_str::<GraphConfig>(r#"{"retries":1}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"), "{err}");
    }
}
