//! Connection settings for a [`Client`](crate::Client).

use std::fmt;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const ENV_TEAM: &str = "DOCBASE_TEAM";
pub const ENV_TOKEN: &str = "DOCBASE_TOKEN";
pub const ENV_BASE_URL: &str = "DOCBASE_BASE_URL";

/// Team, access token and an optional base URL override.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub team: String,
    pub token: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Read `DOCBASE_TEAM`, `DOCBASE_TOKEN` and `DOCBASE_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{key} is not set")))
        };
        Ok(Self {
            team: required(ENV_TEAM)?,
            token: required(ENV_TOKEN)?,
            base_url: lookup(ENV_BASE_URL).filter(|value| !value.trim().is_empty()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("team", &self.team)
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_required_and_optional_values() {
        let config = Config::from_lookup(lookup(&[
            ("DOCBASE_TEAM", "kray"),
            ("DOCBASE_TOKEN", "secret"),
            ("DOCBASE_BASE_URL", "http://127.0.0.1:3000/teams/kray"),
        ]))
        .unwrap();
        assert_eq!(config.team, "kray");
        assert_eq!(config.token, "secret");
        assert_eq!(
            config.base_url.as_deref(),
            Some("http://127.0.0.1:3000/teams/kray")
        );
    }

    #[test]
    fn missing_token_is_reported_by_name() {
        let err = Config::from_lookup(lookup(&[("DOCBASE_TEAM", "kray")])).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("DOCBASE_TOKEN")));
    }

    #[test]
    fn blank_base_url_is_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("DOCBASE_TEAM", "kray"),
            ("DOCBASE_TOKEN", "secret"),
            ("DOCBASE_BASE_URL", " "),
        ]))
        .unwrap();
        assert!(config.base_url.is_none());
    }

    #[test]
    fn deserializes_from_json() {
        let config: Config = serde_json::from_str(r#"{"team":"kray","token":"s3cret"}"#).unwrap();
        assert_eq!(config.team, "kray");
        assert!(config.base_url.is_none());
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
