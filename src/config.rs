use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Weekday};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Longest window the reservation API accepts in a single request.
pub const MAX_RANGE_DAYS: i64 = 44;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub facility: FacilityConfig,
    pub search: SearchConfig,
    pub network: NetworkConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FacilityConfig {
    pub resource_id: u64,
    pub name: String,
    pub api_base_url: String,
    pub customer_id: u64,
    pub company_id: u64,
    pub locale: String,
    pub user_agent: String,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            resource_id: DEFAULT_RESOURCE_ID,
            name: DEFAULT_FACILITY_NAME.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            customer_id: 0,
            company_id: 0,
            locale: "en-US".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// One request window, inclusive on both ends.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days between start and end.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_date_ranges")]
    pub date_ranges: Vec<DateRange>,
    pub target_weekday: Weekday,
    /// Daily status code the API uses for "bookable".
    pub available_status: i64,
    /// `headers.response_code` value of a successful API call.
    pub success_code: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            date_ranges: default_date_ranges(),
            target_weekday: Weekday::Sat,
            available_status: 0,
            success_code: DEFAULT_SUCCESS_CODE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// How the local alert is raised.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocalBackend {
    #[default]
    Command,
    Desktop,
    Off,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandConfig {
    pub program: String,
    /// Argument templates; `{title}` and `{message}` are substituted.
    pub args: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: "notify-send".to_string(),
            args: vec!["{title}".to_string(), "{message}".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub ntfy_server: String,
    /// Ntfy topic the operator's phone subscribes to (e.g., "park-monitor-alerts")
    pub ntfy_topic: String,
    pub local_backend: LocalBackend,
    pub command: CommandConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ntfy_server: DEFAULT_NTFY_SERVER.to_string(),
            ntfy_topic: DEFAULT_NTFY_TOPIC.to_string(),
            local_backend: LocalBackend::default(),
            command: CommandConfig::default(),
        }
    }
}

const DEFAULT_RESOURCE_ID: u64 = 1160;
const DEFAULT_FACILITY_NAME: &str = "Dolores Park Picnic Area";
const DEFAULT_API_BASE_URL: &str =
    "https://anc.apm.activecommunities.com/sfrecpark/rest/reservation/resource/availability/daily";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";
const DEFAULT_SUCCESS_CODE: &str = "0000";
const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";
const DEFAULT_NTFY_TOPIC: &str = "park-monitor-alerts";

fn default_date_ranges() -> Vec<DateRange> {
    // Consecutive windows, each within the API's per-request limit.
    [
        ((2026, 11, 1), (2026, 12, 14)),
        ((2026, 12, 15), (2027, 1, 27)),
        ((2027, 1, 28), (2027, 3, 12)),
    ]
    .into_iter()
    .filter_map(|((sy, sm, sd), (ey, em, ed))| {
        Some(DateRange::new(
            NaiveDate::from_ymd_opt(sy, sm, sd)?,
            NaiveDate::from_ymd_opt(ey, em, ed)?,
        ))
    })
    .collect()
}

impl AppConfig {
    /// Load configuration from defaults, config files and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`AppConfig::load`], with an additional required config file
    /// layered above the implicit ones.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("park-monitor");

        let defaults = FacilityConfig::default();
        let mut builder = Config::builder()
            // 1. Load default values
            // Facility
            .set_default("facility.resource_id", defaults.resource_id)?
            .set_default("facility.name", defaults.name)?
            .set_default("facility.api_base_url", defaults.api_base_url)?
            .set_default("facility.customer_id", defaults.customer_id)?
            .set_default("facility.company_id", defaults.company_id)?
            .set_default("facility.locale", defaults.locale)?
            .set_default("facility.user_agent", defaults.user_agent)?
            // Search
            .set_default("search.target_weekday", "Saturday")?
            .set_default("search.available_status", 0)?
            .set_default("search.success_code", DEFAULT_SUCCESS_CODE)?
            // Network
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            // Notifications
            .set_default("notifications.ntfy_server", DEFAULT_NTFY_SERVER)?
            .set_default("notifications.ntfy_topic", DEFAULT_NTFY_TOPIC)?
            .set_default("notifications.local_backend", "command")?
            .set_default("notifications.command.program", "notify-send")?
            .set_default("notifications.command.args", vec!["{title}", "{message}"])?
            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))
            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false));

        // 4. Explicit file from the command line (must exist)
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // 5. Load from Environment variables (PARK__FACILITY__RESOURCE_ID=...)
        builder = builder.add_source(Environment::with_prefix("PARK").separator("__"));

        let config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Check the date windows against the API's per-request limit.
    pub fn validate(&self) -> Result<()> {
        if self.search.date_ranges.is_empty() {
            anyhow::bail!("search.date_ranges must contain at least one range");
        }

        for range in &self.search.date_ranges {
            if range.end < range.start {
                anyhow::bail!("Date range {} .. {} ends before it starts", range.start, range.end);
            }
            if range.span_days() > MAX_RANGE_DAYS {
                anyhow::bail!(
                    "Date range {} .. {} spans {} days (limit is {})",
                    range.start,
                    range.end,
                    range.span_days(),
                    MAX_RANGE_DAYS
                );
            }
        }

        Ok(())
    }

    /// Pairs of configured ranges that overlap. Not an error, but every
    /// overlapping day is fetched (and reported) twice.
    pub fn overlapping_ranges(&self) -> Vec<(DateRange, DateRange)> {
        let ranges = &self.search.date_ranges;
        let mut pairs = Vec::new();
        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                if a.overlaps(b) {
                    pairs.push((*a, *b));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config_with_ranges(ranges: Vec<DateRange>) -> AppConfig {
        AppConfig {
            facility: FacilityConfig::default(),
            search: SearchConfig {
                date_ranges: ranges,
                ..SearchConfig::default()
            },
            network: NetworkConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }

    // ==================== Default Value Tests ====================

    #[test]
    fn test_network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_facility_config_defaults() {
        let config = FacilityConfig::default();
        assert_eq!(config.customer_id, 0);
        assert_eq!(config.company_id, 0);
        assert_eq!(config.locale, "en-US");
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_search_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.target_weekday, Weekday::Sat);
        assert_eq!(config.available_status, 0);
        assert_eq!(config.success_code, "0000");
        assert_eq!(config.date_ranges.len(), 3);
    }

    #[test]
    fn test_default_ranges_respect_api_limit_and_do_not_overlap() {
        let config = config_with_ranges(default_date_ranges());
        assert!(config.validate().is_ok());
        assert!(config.overlapping_ranges().is_empty());
        for range in &config.search.date_ranges {
            assert!(range.span_days() <= MAX_RANGE_DAYS);
        }
    }

    #[test]
    fn test_notification_config_defaults() {
        let config = NotificationConfig::default();
        assert_eq!(config.ntfy_server, "https://ntfy.sh");
        assert_eq!(config.local_backend, LocalBackend::Command);
        assert_eq!(config.command.args, vec!["{title}", "{message}"]);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_rejects_oversized_range() {
        let config = config_with_ranges(vec![DateRange::new(date(2026, 11, 1), date(2026, 12, 20))]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("limit is 44"));
    }

    #[test]
    fn test_validate_accepts_exactly_44_days() {
        let config = config_with_ranges(vec![DateRange::new(date(2026, 11, 1), date(2026, 12, 15))]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_reversed_range() {
        let config = config_with_ranges(vec![DateRange::new(date(2026, 12, 1), date(2026, 11, 1))]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_ranges() {
        let config = config_with_ranges(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlap_is_reported_not_rejected() {
        let a = DateRange::new(date(2026, 11, 1), date(2026, 11, 30));
        let b = DateRange::new(date(2026, 11, 28), date(2026, 12, 20));
        let config = config_with_ranges(vec![a, b]);

        assert!(config.validate().is_ok());
        assert_eq!(config.overlapping_ranges(), vec![(a, b)]);
    }

    // ==================== Config Loading Tests ====================

    #[test]
    fn test_config_load_with_defaults() {
        let config = AppConfig::load().expect("Config should load");
        assert!(!config.facility.api_base_url.is_empty());
        assert!(!config.search.date_ranges.is_empty());
        assert!(config.network.request_timeout_secs > 0);
    }

    #[test]
    fn test_explicit_config_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[facility]
resource_id = 77
name = "Test Meadow"

[search]
target_weekday = "Sunday"
date_ranges = [
    {{ start = "2027-04-01", end = "2027-05-01" }},
]

[notifications]
ntfy_topic = "test-topic"
local_backend = "off"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(Some(file.path())).expect("Config should load");

        assert_eq!(config.facility.resource_id, 77);
        assert_eq!(config.facility.name, "Test Meadow");
        assert_eq!(config.search.target_weekday, Weekday::Sun);
        assert_eq!(
            config.search.date_ranges,
            vec![DateRange::new(date(2027, 4, 1), date(2027, 5, 1))]
        );
        assert_eq!(config.notifications.ntfy_topic, "test-topic");
        assert_eq!(config.notifications.local_backend, LocalBackend::Off);
        // Untouched keys keep their defaults
        assert_eq!(config.facility.locale, "en-US");
    }

    #[test]
    fn test_explicit_config_file_with_invalid_range_fails() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[search]
date_ranges = [
    {{ start = "2027-01-01", end = "2027-03-01" }},
]
"#
        )
        .unwrap();

        assert!(AppConfig::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let result = AppConfig::load_from(Some(Path::new("/nonexistent/park-monitor.toml")));
        assert!(result.is_err());
    }

    // ==================== Environment Variable Override Tests ====================

    #[test]
    fn test_env_var_overrides_network_timeout() {
        let env_key = "PARK__NETWORK__CONNECT_TIMEOUT_SECS";

        // SAFETY: Test environment; no other test reads this key
        unsafe {
            std::env::set_var(env_key, "7");
        }
        let config = AppConfig::load();
        unsafe {
            std::env::remove_var(env_key);
        }

        assert_eq!(config.expect("Config should load").network.connect_timeout_secs, 7);
    }
}
