use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::paths::TallyPaths;

pub const DEFAULT_API_URL: &str = "http://localhost:5175/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const API_TOKEN_ENV: &str = "TALLY_API_TOKEN";

/// Which [`DataSource`](crate::DataSource) to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    #[default]
    Fixture,
    Remote,
}

impl std::str::FromStr for DataSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixture" | "mock" => Ok(Self::Fixture),
            "remote" | "api" => Ok(Self::Remote),
            other => Err(format!("unknown data source '{other}' (expected fixture or remote)")),
        }
    }
}

/// Settings read from `.tally/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub source: DataSourceKind,
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Fixture,
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TallyConfig {
    /// Load from `.tally/config.json`; a missing file yields defaults.
    /// `TALLY_API_TOKEN` overrides the stored token.
    pub fn load(paths: &TallyPaths) -> StoreResult<Self> {
        let mut config = match std::fs::read_to_string(&paths.config_json) {
            Ok(content) => Self::from_json(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.trim().is_empty() {
                config.api_token = Some(token);
            }
        }
        tracing::debug!(path = %paths.config_json.display(), source = ?config.source, "config loaded");
        Ok(config)
    }

    /// Parse the flat key/value config map. Unknown keys are ignored.
    pub fn from_json(content: &str) -> StoreResult<Self> {
        let config: Self = serde_json::from_str(content).map_err(|e| StoreError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> StoreResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(StoreError::Config {
                reason: "api_url must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(StoreError::Config {
                reason: "timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = TallyPaths::discover(tmp.path());
        let config = TallyConfig::load(&paths).unwrap();
        assert_eq!(config.source, DataSourceKind::Fixture);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let config =
            TallyConfig::from_json(r#"{"source":"remote","timeout_secs":5,"other":true}"#).unwrap();
        assert_eq!(config.source, DataSourceKind::Remote);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(
            TallyConfig::from_json(r#"{"source":"carrier-pigeon"}"#),
            Err(StoreError::Config { .. })
        ));
        assert!(matches!(
            TallyConfig::from_json(r#"{"timeout_secs":0}"#),
            Err(StoreError::Config { .. })
        ));
        assert!(matches!(
            TallyConfig::from_json(r#"{"api_url":"  "}"#),
            Err(StoreError::Config { .. })
        ));
    }

    #[test]
    fn load_reads_written_file() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = TallyPaths::discover(tmp.path());
        crate::paths::write_atomic(
            &paths.config_json,
            br#"{"source":"remote","api_url":"http://clinic.local/api"}"#,
        )
        .unwrap();
        let config = TallyConfig::load(&paths).unwrap();
        assert_eq!(config.source, DataSourceKind::Remote);
        assert_eq!(config.api_url, "http://clinic.local/api");
    }

    #[test]
    fn source_kind_parses_aliases() {
        assert_eq!("mock".parse::<DataSourceKind>().unwrap(), DataSourceKind::Fixture);
        assert_eq!("Remote".parse::<DataSourceKind>().unwrap(), DataSourceKind::Remote);
        assert!("disk".parse::<DataSourceKind>().is_err());
    }
}
