use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::model::CityTarget;

/// Upper bound for `retry.base_delay_ms` (ten minutes).
const MAX_BASE_DELAY_MS: u64 = 600_000;

/// Retry budget shared by every outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n * base_delay_ms` before the next try.
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            timeout_secs: 12,
        }
    }
}

/// Base URLs of the three upstream sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Open-Meteo forecast endpoint.
    pub weather: String,
    /// exchangerate.host root; `/latest` and `/<date>` are appended.
    pub currency: String,
    /// WorldTimeAPI timezone root; `/<timezone>` is appended.
    pub local_time: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weather: "https://api.open-meteo.com/v1/forecast".to_string(),
            currency: "https://api.exchangerate.host".to_string(),
            local_time: "http://worldtimeapi.org/api/timezone".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// data_dir = "/var/lib/ivv"
/// reference_currency = "USD"
///
/// [retry]
/// max_attempts = 3
///
/// [[cities]]
/// name = "London"
/// lat = 51.5074
/// lon = -0.1278
/// timezone = "Europe/London"
/// currency = "GBP"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where snapshots and the cumulative table are written.
    pub data_dir: PathBuf,
    /// Log destination; stderr when unset.
    pub log_file: Option<PathBuf>,
    /// Base of every exchange rate.
    pub reference_currency: String,
    pub retry: RetrySettings,
    pub endpoints: Endpoints,
    pub cities: Vec<CityTarget>,
}

impl Default for Config {
    fn default() -> Self {
        let dirs = project_dirs();
        let data_dir = dirs
            .as_ref()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"));
        let log_file = dirs
            .as_ref()
            .map(|d| d.data_local_dir().join("logs").join("pipeline.log"));

        Self {
            data_dir,
            log_file,
            reference_currency: "USD".to_string(),
            retry: RetrySettings::default(),
            endpoints: Endpoints::default(),
            cities: default_roster(),
        }
    }
}

impl Config {
    /// Load config from the platform location, or return the default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from an explicit path, or return the default if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs =
            project_dirs().ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check the whole configuration and report every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.cities.is_empty() {
            problems.push("cities: roster is empty".to_string());
        }
        if !is_currency_code(&self.reference_currency) {
            problems.push(format!(
                "reference_currency: '{}' is not a 3-letter currency code",
                self.reference_currency
            ));
        }
        if self.retry.max_attempts == 0 {
            problems.push("retry.max_attempts: must be at least 1".to_string());
        }
        if self.retry.base_delay_ms > MAX_BASE_DELAY_MS {
            problems.push(format!(
                "retry.base_delay_ms: {} exceeds {MAX_BASE_DELAY_MS}",
                self.retry.base_delay_ms
            ));
        }
        if self.retry.timeout_secs == 0 {
            problems.push("retry.timeout_secs: must be at least 1".to_string());
        }

        let mut seen = HashSet::new();
        for city in &self.cities {
            let name = city.name.trim();
            if name.is_empty() {
                problems.push("cities: entry with empty name".to_string());
                continue;
            }
            if !seen.insert(name.to_lowercase()) {
                problems.push(format!("cities.{name}: duplicate city name"));
            }
            if !(-90.0..=90.0).contains(&city.lat) {
                problems.push(format!("cities.{name}.lat: {} is out of range", city.lat));
            }
            if !(-180.0..=180.0).contains(&city.lon) {
                problems.push(format!("cities.{name}.lon: {} is out of range", city.lon));
            }
            if city.timezone.trim().is_empty() {
                problems.push(format!("cities.{name}.timezone: must not be empty"));
            }
            if !is_currency_code(&city.currency) {
                problems.push(format!(
                    "cities.{name}.currency: '{}' is not a 3-letter currency code",
                    city.currency
                ));
            }
        }

        if !problems.is_empty() {
            bail!("Invalid configuration: {}", problems.join("; "));
        }
        Ok(())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "ivv", "ivv")
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

fn city(name: &str, lat: f64, lon: f64, timezone: &str, currency: &str) -> CityTarget {
    CityTarget {
        name: name.to_string(),
        lat,
        lon,
        timezone: timezone.to_string(),
        currency: currency.to_string(),
    }
}

/// Roster written by `ivv init` and used when no config file exists.
pub fn default_roster() -> Vec<CityTarget> {
    vec![
        city("New York", 40.7128, -74.0060, "America/New_York", "USD"),
        city("London", 51.5074, -0.1278, "Europe/London", "GBP"),
        city("Tokyo", 35.6895, 139.6917, "Asia/Tokyo", "JPY"),
        city("Sao Paulo", -23.5505, -46.6333, "America/Sao_Paulo", "BRL"),
        city("Sydney", -33.8688, 151.2093, "Australia/Sydney", "AUD"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        cfg.validate().expect("default config must validate");
        assert_eq!(cfg.cities.len(), 5);
        assert_eq!(cfg.cities[0].name, "New York");
        assert_eq!(cfg.reference_currency, "USD");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg = Config::from_toml(
            r#"
            data_dir = "/tmp/ivv"

            [retry]
            max_attempts = 5

            [[cities]]
            name = "Madrid"
            lat = 40.4168
            lon = -3.7038
            timezone = "Europe/Madrid"
            currency = "EUR"
            "#,
        )
        .expect("toml should parse");

        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/ivv"));
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.base_delay_ms, 2000);
        assert_eq!(cfg.endpoints, Endpoints::default());
        assert_eq!(cfg.cities.len(), 1);
        assert_eq!(cfg.cities[0].currency, "EUR");
        cfg.validate().expect("config must validate");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config::default();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.cities, default_roster());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "cities = 7").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn validate_rejects_empty_roster() {
        let cfg = Config {
            cities: Vec::new(),
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("roster is empty"));
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut cfg = Config::default();
        cfg.retry.max_attempts = 0;
        cfg.cities.push(city("London", 95.0, -200.0, "", "pounds"));

        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("max_attempts"));
        assert!(msg.contains("duplicate city name"));
        assert!(msg.contains("lat: 95 is out of range"));
        assert!(msg.contains("lon: -200 is out of range"));
        assert!(msg.contains("timezone: must not be empty"));
        assert!(msg.contains("'pounds' is not a 3-letter currency code"));
    }

    #[test]
    fn validate_rejects_unbounded_base_delay() {
        let mut cfg = Config::default();
        cfg.retry.base_delay_ms = u64::MAX;

        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("retry.base_delay_ms: 18446744073709551615 exceeds 600000"));
    }
}
