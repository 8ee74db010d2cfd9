//! Runtime configuration: YAML file, then CLI overrides, then defaults.
//!
//! ```yaml
//! bind: 0.0.0.0:5000
//! data_dir: /var/lib/jk_notifications
//! index_page: templates/index.html
//! schedule:
//!   hour: 0
//!   minute: 0
//! fetch_timeout_secs: 30
//! scrape_on_start: false
//! sources:
//!   jkssb:
//!     listing_url: https://jkssb.nic.in/Whatsnew.html
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

use crate::cli::Cli;
use crate::errors::ConfigError;
use crate::scheduler::Cadence;
use crate::sources::{Source, SourceTarget};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Listen address for the JSON API.
    pub bind: String,
    /// Directory holding the per-source SQLite files.
    pub data_dir: PathBuf,
    /// Pre-built front-end entry page served at `/`.
    pub index_page: PathBuf,
    pub schedule: ScheduleConfig,
    /// Upper bound on one listing-page request.
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    /// Run every pipeline once at startup instead of waiting for the first trigger.
    pub scrape_on_start: bool,
    /// Per-source url overrides.
    pub sources: BTreeMap<Source, SourceOverride>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            data_dir: PathBuf::from("."),
            index_page: PathBuf::from("templates/index.html"),
            schedule: ScheduleConfig::default(),
            fetch_timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            scrape_on_start: false,
            sources: BTreeMap::new(),
        }
    }
}

/// Daily trigger time, local wall clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleConfig {
    pub fn cadence(&self) -> Result<Cadence, ConfigError> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
            .map(Cadence::DailyAt)
            .ok_or(ConfigError::InvalidSchedule {
                hour: self.hour,
                minute: self.minute,
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOverride {
    pub base_url: Option<Url>,
    pub listing_url: Option<Url>,
}

impl AppConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(bind) = &cli.bind {
            self.bind = bind.clone();
        }
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
        if cli.scrape_on_start {
            self.scrape_on_start = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule.cadence()?;
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Resolved listing location for `source`, honoring overrides.
    pub fn target(&self, source: Source) -> Result<SourceTarget, ConfigError> {
        let target = match self.sources.get(&source) {
            Some(o) => SourceTarget::with_overrides(source, o.base_url.clone(), o.listing_url.clone())?,
            None => SourceTarget::new(source)?,
        };
        Ok(target)
    }
}

/// Load the config file at `path`, or defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(AppConfig::default());
    };
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = AppConfig::from_yaml(&yaml)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_match_observed_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.bind, "127.0.0.1:5000");
        assert_eq!(config.schedule.cadence().unwrap(), Cadence::midnight());
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert!(!config.scrape_on_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = AppConfig::from_yaml(
            "bind: 0.0.0.0:8080\nschedule:\n  hour: 6\nscrape_on_start: true\n",
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.schedule, ScheduleConfig { hour: 6, minute: 0 });
        assert!(config.scrape_on_start);
        assert_eq!(config.fetch_timeout_secs, 30);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config.bind, AppConfig::default().bind);
    }

    #[test]
    fn test_source_overrides() {
        let config = AppConfig::from_yaml(
            "sources:\n  jkssb:\n    listing_url: http://mirror.local/Whatsnew.html\n",
        )
        .unwrap();

        let jkssb = config.target(Source::Jkssb).unwrap();
        assert_eq!(jkssb.listing_url.as_str(), "http://mirror.local/Whatsnew.html");
        assert_eq!(jkssb.base_url.as_str(), "https://jkssb.nic.in/");

        let jkpsc = config.target(Source::Jkpsc).unwrap();
        assert_eq!(jkpsc, SourceTarget::new(Source::Jkpsc).unwrap());
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let err = AppConfig::from_yaml("schedule:\n  hour: 24\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSchedule { hour: 24, minute: 0 }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = AppConfig::from_yaml("fetch_timeout_secs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(
            AppConfig::from_yaml("smtp_host: mail.local\n").unwrap_err(),
            ConfigError::Yaml(_)
        ));
        assert!(AppConfig::from_yaml("sources:\n  upsc: {}\n").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = AppConfig::from_yaml("bind: 0.0.0.0:8080\ndata_dir: /srv/jk\n").unwrap();
        let cli = Cli::parse_from(["jk_notifications", "--bind", "127.0.0.1:9000", "--scrape-on-start"]);
        config.apply_cli(&cli);

        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.data_dir, PathBuf::from("/srv/jk"));
        assert!(config.scrape_on_start);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "fetch_timeout_secs: 12\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(12));

        let missing = load_config(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
