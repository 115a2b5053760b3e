//! Loader for runner configuration with YAML + environment overlays.
//!
//! A `pilot.yaml` names the page to open, the WebDriver endpoint, the settle
//! timings, the focus bound and the list of steps to run. Any scalar can be
//! overridden with `PILOT__<SECTION>__<KEY>` variables, which win over files.
//! String values may reference `${VAR}`; those are expanded after merging.
//! A fill step's `text` may be written unquoted when it is a plain number
//! (`text: 10115`); quote it when leading zeros matter (`text: "01067"`).
use config::{Config, ConfigError, Environment, File};
use pilot_common::LogFormat;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct PilotConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub webdriver: WebDriverConfig,
    #[serde(default)]
    pub timings: TimingsConfig,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebDriverConfig {
    #[serde(default = "default_webdriver_url")]
    pub url: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_window")]
    pub window: (u32, u32),
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            headless: false,
            window: default_window(),
        }
    }
}

/// Settle delays in milliseconds.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimingsConfig {
    #[serde(default = "default_focus_retry_ms")]
    pub focus_retry_ms: u64,
    #[serde(default = "default_post_select_ms")]
    pub post_select_ms: u64,
    #[serde(default = "default_post_delete_ms")]
    pub post_delete_ms: u64,
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            focus_retry_ms: default_focus_retry_ms(),
            post_select_ms: default_post_select_ms(),
            post_delete_ms: default_post_delete_ms(),
        }
    }
}

/// Bound on the click-until-focused loop. `null` disables a limit.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FocusConfig {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default = "default_focus_max_elapsed_ms")]
    pub max_elapsed_ms: Option<u64>,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            max_elapsed_ms: default_focus_max_elapsed_ms(),
        }
    }
}

/// Read the field back after typing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VerifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_verify_settle_ms")]
    pub settle_ms: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            settle_ms: default_verify_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub emit_stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            dir: None,
            emit_stderr: true,
            filter: default_filter(),
        }
    }
}

/// Shared fields + the per-action details.
#[derive(Debug, Clone, Deserialize)]
pub struct StepSpec {
    pub id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub details: StepDetails,
}

impl StepSpec {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// The tag is `action`; the remaining keys are its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action")]
pub enum StepDetails {
    #[serde(rename = "focus")]
    Focus { selector: String },

    #[serde(rename = "fill")]
    Fill {
        selector: String,
        #[serde(deserialize_with = "scalar_text")]
        text: String,
    },
}

/// YAML and `try_parsing` env values turn `10115` into a number; keep it as text.
fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(D::Error::custom(format!(
            "fill text must be a string or number, found {other}"
        ))),
    }
}

impl StepDetails {
    pub fn selector(&self) -> &str {
        match self {
            StepDetails::Focus { selector } | StepDetails::Fill { selector, .. } => selector,
        }
    }
}

impl PilotConfig {
    /// Steps that are not switched off, in file order.
    pub fn enabled_steps(&self) -> impl Iterator<Item = &StepSpec> {
        self.steps.iter().filter(|s| s.is_enabled())
    }

    /// Reject configs the runner cannot execute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate step id `{}`",
                    step.id
                )));
            }
            if step.details.selector().trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "step `{}` has an empty selector",
                    step.id
                )));
            }
        }
        if self.timings.focus_retry_ms == 0 && self.focus.max_attempts.is_none() {
            return Err(ConfigError::Message(
                "timings.focus_retry_ms of 0 needs focus.max_attempts".into(),
            ));
        }
        Ok(())
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_window() -> (u32, u32) {
    (1440, 900)
}
fn default_focus_retry_ms() -> u64 {
    800
}
fn default_post_select_ms() -> u64 {
    300
}
fn default_post_delete_ms() -> u64 {
    500
}
fn default_focus_max_elapsed_ms() -> Option<u64> {
    Some(60_000)
}
fn default_verify_settle_ms() -> u64 {
    500
}
fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PilotConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PilotConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PilotConfigLoader {
    /// Start empty; `PILOT__` environment overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use pilot_config::PilotConfigLoader;
    ///
    /// let config = PilotConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nsteps: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert!(config.steps.is_empty());
    /// assert_eq!(config.timings.focus_retry_ms, 800);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so a run can be configured purely from env.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use pilot_config::{PilotConfigLoader, StepDetails};
    ///
    /// let cfg = PilotConfigLoader::new()
    ///     .with_yaml_str(
    ///         r##"
    /// version: "test"
    /// steps:
    ///   - id: "email"
    ///     action: "fill"
    ///     selector: "#email"
    ///     text: "a@x.com"
    /// "##,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.steps.len(), 1);
    /// assert!(matches!(cfg.steps[0].details, StepDetails::Fill { .. }));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `PILOT__`-prefixed environment variables are layered last, then
    /// `${VAR}` placeholders are expanded.
    ///
    /// ```
    /// use pilot_config::{PilotConfigLoader, StepDetails};
    ///
    /// unsafe { std::env::set_var("APPLICANT_EMAIL", "b@y.com"); }
    ///
    /// let config = PilotConfigLoader::new()
    ///     .with_yaml_str(r##"
    /// version: "1"
    /// steps:
    ///   - id: "email"
    ///     action: "fill"
    ///     selector: "#email"
    ///     text: "${APPLICANT_EMAIL}"
    /// "##)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match &config.steps[0].details {
    ///     StepDetails::Fill { selector, text } => {
    ///         assert_eq!(selector, "#email");
    ///         assert_eq!(text, "b@y.com");
    ///     }
    ///     _ => panic!("expected a fill step"),
    /// }
    ///
    /// unsafe { std::env::remove_var("APPLICANT_EMAIL"); }
    /// ```
    pub fn load(self) -> Result<PilotConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("PILOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: PilotConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        typed.validate()?;
        Ok(typed)
    }
}
