//! Runtime configuration shared by every pipeline stage.
//!
//! One validated object carries the knobs that used to drift between script
//! variants: pass count, output token budgets, timezone, generator endpoint
//! and retry policy.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use crate::error::{WeekrepError, WeekrepResult};

#[derive(Debug, Clone, Deserialize)]
pub struct WeekrepConfig {
    /// Directory scanned for `.ics` sources.
    #[serde(default = "default_calendar_dir")]
    pub calendar_dir: String,

    /// Directory receiving the pass logs and the final report.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,

    /// Independent summarization passes per day. 2 or 3; log slot 3 doubles
    /// as the escalation log, so 3 regular passes go straight to a three-way
    /// comparison.
    #[serde(default = "default_passes")]
    pub passes: u8,

    /// Merge same-date buckets across sources instead of summarizing each
    /// source's buckets as a separate batch.
    #[serde(default)]
    pub merge_sources: bool,

    /// IANA timezone override; empty means auto-detect.
    #[serde(default)]
    pub timezone: String,

    /// Display name of the calendar owner, woven into the prompts.
    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Generation-service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// OpenAI-style chat-completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output budget for one day's summary pass.
    #[serde(default = "default_day_max_tokens")]
    pub day_max_tokens: u32,

    /// Output budget for the comparison/consolidation calls, which see whole
    /// logs rather than one day.
    #[serde(default = "default_consolidation_max_tokens")]
    pub consolidation_max_tokens: u32,

    /// Output budget for the single escalation pass.
    #[serde(default = "default_escalation_max_tokens")]
    pub escalation_max_tokens: u32,

    /// Stop sequences forwarded with every request.
    #[serde(default)]
    pub stop: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per request; failures past the last attempt degrade to the
    /// no-output sentinel at the call site.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Initial backoff between attempts, doubled after each failure.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_calendar_dir() -> String {
    ".".to_string()
}
fn default_report_dir() -> String {
    ".".to_string()
}
fn default_passes() -> u8 {
    2
}
fn default_endpoint() -> String {
    "http://localhost:1234/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "local-model".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_day_max_tokens() -> u32 {
    2048
}
fn default_consolidation_max_tokens() -> u32 {
    16384
}
fn default_escalation_max_tokens() -> u32 {
    2048
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_retries() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    500
}

impl Default for WeekrepConfig {
    fn default() -> Self {
        WeekrepConfig {
            calendar_dir: default_calendar_dir(),
            report_dir: default_report_dir(),
            passes: default_passes(),
            merge_sources: false,
            timezone: String::new(),
            user_name: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            day_max_tokens: default_day_max_tokens(),
            consolidation_max_tokens: default_consolidation_max_tokens(),
            escalation_max_tokens: default_escalation_max_tokens(),
            stop: Vec::new(),
            request_timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# weekrep configuration

# Directory scanned for .ics files (defaults to the working directory).
# calendar_dir = "~/calendar"

# Directory receiving pass logs and the final report.
# report_dir = "."

# Independent summarization passes per day (2 or 3).
# passes = 2

# Merge same-date events across sources before summarizing.
# merge_sources = false

# IANA timezone; leave empty to auto-detect.
# timezone = "Europe/Stockholm"

[generator]
# endpoint = "http://localhost:1234/v1/chat/completions"
# model = "local-model"
# temperature = 0.7
# day_max_tokens = 2048
# consolidation_max_tokens = 16384
# request_timeout_secs = 120
# retries = 3
# backoff_ms = 500
"#;

impl WeekrepConfig {
    /// Config file path (`~/.config/weekrep/config.toml`).
    pub fn config_path() -> WeekrepResult<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| WeekrepError::Config("could not determine config directory".into()))?;
        Ok(dir.join("weekrep").join("config.toml"))
    }

    /// Load the config, writing a commented default file on first run.
    pub fn load() -> WeekrepResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::write_default(&path)?;
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> WeekrepResult<Self> {
        let cfg: WeekrepConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| WeekrepError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| WeekrepError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> WeekrepResult<()> {
        if !(2..=3).contains(&self.passes) {
            return Err(WeekrepError::Config(format!(
                "passes must be 2 or 3, got {}",
                self.passes
            )));
        }
        if self.generator.retries == 0 {
            return Err(WeekrepError::Config("retries must be at least 1".into()));
        }
        Ok(())
    }

    pub fn calendar_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.calendar_dir).into_owned())
    }

    pub fn report_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.report_dir).into_owned())
    }

    fn write_default(path: &Path) -> WeekrepResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }
}
