//! Settings store for hostprobe
//!
//! A sectioned key/value file (TOML) holding benchmark, CPU, GPU, output and
//! logging settings. Loading is lenient: a missing or unparseable key falls
//! back to its documented default. Saving is a read-modify-write of the file
//! on disk that touches only the keys changed since load; everything else,
//! comments and formatting included, is written back byte for byte.
//!
//! Precedence for a run (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (HOSTPROBE_* prefix)
//! 3. Settings file
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toml::{Table, Value};
use toml_edit::{DocumentMut, Item};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::gpu::VendorPreference;

/// Default location of the settings file, relative to the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.toml";

/// Every key owned by the typed accessors, as `section.key`
pub const KNOWN_KEYS: &[&str] = &[
    "benchmark.cpu_iterations",
    "benchmark.gpu_iterations",
    "benchmark.polling_interval_sec",
    "cpu.monitor_usage",
    "gpu.enable",
    "gpu.vendor",
    "output.json_path",
    "output.log_to_file",
    "logging.level",
    "logging.file",
    "logging.json_format",
];

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Typed view of the settings file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub benchmark: BenchmarkSettings,
    pub cpu: CpuSettings,
    pub gpu: GpuSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

/// Benchmark workload sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSettings {
    /// Square roots summed by each CPU worker
    pub cpu_iterations: u64,

    /// Matrix multiplications for the GPU stress run
    pub gpu_iterations: u64,

    /// Utilization sampling window in seconds
    pub polling_interval_sec: f64,
}

/// CPU benchmark behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSettings {
    /// Sample per-core utilization after the benchmark
    pub monitor_usage: bool,
}

/// GPU stress settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuSettings {
    /// Allow the GPU stress run at all
    pub enable: bool,

    /// Preferred vendor: auto, nvidia, amd, intel, apple or none
    pub vendor: String,
}

/// Output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Where benchmark results are written
    pub json_path: String,

    /// Mirror logs into `logging.file`
    pub log_to_file: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file used when `output.log_to_file` is set
    pub file: String,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            cpu_iterations: 10_000_000,
            gpu_iterations: 10_000_000,
            polling_interval_sec: 1.0,
        }
    }
}

impl Default for CpuSettings {
    fn default() -> Self {
        Self { monitor_usage: true }
    }
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            enable: true,
            vendor: "auto".to_string(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            json_path: "results.json".to_string(),
            log_to_file: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "logs/hostprobe.log".to_string(),
            json_format: false,
        }
    }
}

impl Settings {
    /// Build typed settings from a parsed document, defaulting anything
    /// missing or malformed
    pub fn from_document(doc: &Table) -> Self {
        let d = Settings::default();
        Self {
            benchmark: BenchmarkSettings {
                cpu_iterations: read_u64(doc, "benchmark", "cpu_iterations", d.benchmark.cpu_iterations),
                gpu_iterations: read_u64(doc, "benchmark", "gpu_iterations", d.benchmark.gpu_iterations),
                polling_interval_sec: read_f64(
                    doc,
                    "benchmark",
                    "polling_interval_sec",
                    d.benchmark.polling_interval_sec,
                ),
            },
            cpu: CpuSettings {
                monitor_usage: read_bool(doc, "cpu", "monitor_usage", d.cpu.monitor_usage),
            },
            gpu: GpuSettings {
                enable: read_bool(doc, "gpu", "enable", d.gpu.enable),
                vendor: read_string(doc, "gpu", "vendor", &d.gpu.vendor),
            },
            output: OutputSettings {
                json_path: read_string(doc, "output", "json_path", &d.output.json_path),
                log_to_file: read_bool(doc, "output", "log_to_file", d.output.log_to_file),
            },
            logging: LoggingSettings {
                level: read_string(doc, "logging", "level", &d.logging.level),
                file: read_string(doc, "logging", "file", &d.logging.file),
                json_format: read_bool(doc, "logging", "json_format", d.logging.json_format),
            },
        }
    }

    /// Write the owned keys whose value differs from `base` into `doc`.
    /// Returns the keys written.
    pub fn merge_changes(&self, base: &Settings, doc: &mut DocumentMut) -> Result<Vec<&'static str>> {
        let mut written = Vec::new();
        for &key in KNOWN_KEYS {
            if self.get(key)? == base.get(key)? {
                continue;
            }
            let Some((section, name)) = key.split_once('.') else {
                continue;
            };
            put(doc, section, name, self.toml_value(key)?);
            written.push(key);
        }
        Ok(written)
    }

    /// Owned value as a TOML value for the settings file
    fn toml_value(&self, key: &str) -> Result<toml_edit::Value> {
        let value: toml_edit::Value = match key {
            "benchmark.cpu_iterations" => to_toml_int(key, self.benchmark.cpu_iterations)?.into(),
            "benchmark.gpu_iterations" => to_toml_int(key, self.benchmark.gpu_iterations)?.into(),
            "benchmark.polling_interval_sec" => self.benchmark.polling_interval_sec.into(),
            "cpu.monitor_usage" => self.cpu.monitor_usage.into(),
            "gpu.enable" => self.gpu.enable.into(),
            "gpu.vendor" => self.gpu.vendor.as_str().into(),
            "output.json_path" => self.output.json_path.as_str().into(),
            "output.log_to_file" => self.output.log_to_file.into(),
            "logging.level" => self.logging.level.as_str().into(),
            "logging.file" => self.logging.file.as_str().into(),
            "logging.json_format" => self.logging.json_format.into(),
            other => return Err(Error::UnknownSetting(other.to_string())),
        };
        Ok(value)
    }

    /// Apply HOSTPROBE_* environment overrides. Used for the effective run
    /// settings only; overrides are never written back to the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOSTPROBE_CPU_ITERATIONS") {
            if let Ok(n) = val.trim().parse() {
                self.benchmark.cpu_iterations = n;
            }
        }
        if let Ok(val) = std::env::var("HOSTPROBE_GPU_ITERATIONS") {
            if let Ok(n) = val.trim().parse() {
                self.benchmark.gpu_iterations = n;
            }
        }
        if let Ok(val) = std::env::var("HOSTPROBE_POLLING_INTERVAL") {
            if let Ok(secs) = val.trim().parse() {
                self.benchmark.polling_interval_sec = secs;
            }
        }
        if let Ok(val) = std::env::var("HOSTPROBE_GPU_ENABLE") {
            if let Some(enabled) = parse_bool(&val) {
                self.gpu.enable = enabled;
            }
        }
        if let Ok(val) = std::env::var("HOSTPROBE_JSON_PATH") {
            self.output.json_path = val;
        }
        if let Ok(val) = std::env::var("HOSTPROBE_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.benchmark.cpu_iterations == 0 {
            return Err(Error::settings_invalid("benchmark.cpu_iterations", "must be greater than 0"));
        }
        if self.benchmark.gpu_iterations == 0 {
            return Err(Error::settings_invalid("benchmark.gpu_iterations", "must be greater than 0"));
        }
        to_toml_int("benchmark.cpu_iterations", self.benchmark.cpu_iterations)?;
        to_toml_int("benchmark.gpu_iterations", self.benchmark.gpu_iterations)?;
        let interval = self.benchmark.polling_interval_sec;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(Error::settings_invalid(
                "benchmark.polling_interval_sec",
                "must be a positive number of seconds",
            ));
        }
        VendorPreference::parse(&self.gpu.vendor)?;
        if self.output.json_path.trim().is_empty() {
            return Err(Error::settings_invalid("output.json_path", "cannot be empty"));
        }
        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::settings_invalid(
                "logging.level",
                format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }

    /// Look up a value by dotted key, rendered as text
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "benchmark.cpu_iterations" => self.benchmark.cpu_iterations.to_string(),
            "benchmark.gpu_iterations" => self.benchmark.gpu_iterations.to_string(),
            "benchmark.polling_interval_sec" => self.benchmark.polling_interval_sec.to_string(),
            "cpu.monitor_usage" => self.cpu.monitor_usage.to_string(),
            "gpu.enable" => self.gpu.enable.to_string(),
            "gpu.vendor" => self.gpu.vendor.clone(),
            "output.json_path" => self.output.json_path.clone(),
            "output.log_to_file" => self.output.log_to_file.to_string(),
            "logging.level" => self.logging.level.clone(),
            "logging.file" => self.logging.file.clone(),
            "logging.json_format" => self.logging.json_format.to_string(),
            other => return Err(Error::UnknownSetting(other.to_string())),
        };
        Ok(value)
    }

    /// Assign a value by dotted key, parsing it per the key's type
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "benchmark.cpu_iterations" => self.benchmark.cpu_iterations = parse_typed(key, value)?,
            "benchmark.gpu_iterations" => self.benchmark.gpu_iterations = parse_typed(key, value)?,
            "benchmark.polling_interval_sec" => {
                self.benchmark.polling_interval_sec = parse_typed(key, value)?
            }
            "cpu.monitor_usage" => self.cpu.monitor_usage = parse_flag(key, value)?,
            "gpu.enable" => self.gpu.enable = parse_flag(key, value)?,
            "gpu.vendor" => {
                VendorPreference::parse(value)?;
                self.gpu.vendor = value.to_string();
            }
            "output.json_path" => self.output.json_path = value.to_string(),
            "output.log_to_file" => self.output.log_to_file = parse_flag(key, value)?,
            "logging.level" => self.logging.level = value.to_string(),
            "logging.file" => self.logging.file = value.to_string(),
            "logging.json_format" => self.logging.json_format = parse_flag(key, value)?,
            other => return Err(Error::UnknownSetting(other.to_string())),
        }
        Ok(())
    }

    /// Benchmark output path with `~` expanded
    pub fn json_path(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.output.json_path))
    }

    /// Log file path with `~` expanded, if file logging is enabled
    pub fn log_file(&self) -> Option<PathBuf> {
        self.output
            .log_to_file
            .then(|| PathBuf::from(expand_path(&self.logging.file)))
    }
}

// ─────────────────────────────────────────────────────────────────
// Settings Store
// ─────────────────────────────────────────────────────────────────

/// File-backed settings with typed accessors
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
    /// Settings as last read from or written to disk
    loaded: Settings,
}

impl SettingsStore {
    /// Load settings from `path`, creating the file with defaults if absent
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = PathBuf::from(expand_path(&path.as_ref().to_string_lossy()));

        if !path.exists() {
            write_default_file(&path)?;
            info!(path = %path.display(), "Created settings file with defaults");
        }

        let doc = read_document(&path)?;
        let settings = Settings::from_document(&doc);
        debug!(path = %path.display(), "Settings loaded");

        Ok(Self {
            path,
            loaded: settings.clone(),
            settings,
        })
    }

    /// Overwrite `path` with the default settings file
    pub fn reset(path: impl AsRef<Path>) -> Result<Self> {
        let path = PathBuf::from(expand_path(&path.as_ref().to_string_lossy()));
        write_default_file(&path)?;
        info!(path = %path.display(), "Settings reset to defaults");
        Ok(Self {
            path,
            settings: Settings::default(),
            loaded: Settings::default(),
        })
    }

    /// Persist the keys changed since load. The file is re-read first and
    /// every other entry is kept as written. A file removed since load is
    /// recreated from the default template.
    pub fn save(&self) -> Result<()> {
        let defaults = Settings::default();
        let (mut doc, base) = if self.path.exists() {
            (read_editable(&self.path)?, &self.loaded)
        } else {
            (template_document()?, &defaults)
        };
        let written = self.settings.merge_changes(base, &mut doc)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
        }
        fs::write(&self.path, doc.to_string()).map_err(|e| Error::write(&self.path, e))?;

        debug!(path = %self.path.display(), keys = ?written, "Settings saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    // -------- benchmark --------

    pub fn cpu_iterations(&self) -> u64 {
        self.settings.benchmark.cpu_iterations
    }

    pub fn set_cpu_iterations(&mut self, n: u64) {
        self.settings.benchmark.cpu_iterations = n;
    }

    pub fn gpu_iterations(&self) -> u64 {
        self.settings.benchmark.gpu_iterations
    }

    pub fn set_gpu_iterations(&mut self, n: u64) {
        self.settings.benchmark.gpu_iterations = n;
    }

    pub fn polling_interval(&self) -> f64 {
        self.settings.benchmark.polling_interval_sec
    }

    pub fn set_polling_interval(&mut self, seconds: f64) {
        self.settings.benchmark.polling_interval_sec = seconds;
    }

    // -------- cpu --------

    pub fn cpu_monitor_usage(&self) -> bool {
        self.settings.cpu.monitor_usage
    }

    pub fn set_cpu_monitor_usage(&mut self, enabled: bool) {
        self.settings.cpu.monitor_usage = enabled;
    }

    // -------- gpu --------

    pub fn gpu_enable(&self) -> bool {
        self.settings.gpu.enable
    }

    pub fn set_gpu_enable(&mut self, enabled: bool) {
        self.settings.gpu.enable = enabled;
    }

    pub fn gpu_vendor(&self) -> &str {
        &self.settings.gpu.vendor
    }

    pub fn set_gpu_vendor(&mut self, vendor: impl Into<String>) {
        self.settings.gpu.vendor = vendor.into();
    }

    // -------- output --------

    pub fn json_path(&self) -> &str {
        &self.settings.output.json_path
    }

    pub fn set_json_path(&mut self, path: impl Into<String>) {
        self.settings.output.json_path = path.into();
    }

    pub fn log_to_file(&self) -> bool {
        self.settings.output.log_to_file
    }

    pub fn set_log_to_file(&mut self, enabled: bool) {
        self.settings.output.log_to_file = enabled;
    }
}

// ─────────────────────────────────────────────────────────────────
// Document helpers
// ─────────────────────────────────────────────────────────────────

fn read_document(path: &Path) -> Result<Table> {
    let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    content.parse::<Table>().map_err(|e| Error::SettingsParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn read_editable(path: &Path) -> Result<DocumentMut> {
    let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    content.parse::<DocumentMut>().map_err(|e| Error::SettingsParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn template_document() -> Result<DocumentMut> {
    generate_default_settings()
        .parse::<DocumentMut>()
        .map_err(|e| Error::Internal(format!("Default settings template is invalid: {}", e)))
}

fn write_default_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }
    fs::write(path, generate_default_settings()).map_err(|e| Error::write(path, e))
}

fn lookup<'a>(doc: &'a Table, section: &str, key: &str) -> Option<&'a Value> {
    doc.get(section).and_then(Value::as_table).and_then(|t| t.get(key))
}

/// Set `section.key` in place, keeping the entry's surrounding whitespace
/// and comments
fn put(doc: &mut DocumentMut, section: &str, key: &str, value: toml_edit::Value) {
    let entry = doc
        .as_table_mut()
        .entry(section)
        .or_insert(Item::Table(toml_edit::Table::new()));
    if !entry.is_table_like() {
        warn!(section, "Replacing non-table value with settings section");
        *entry = Item::Table(toml_edit::Table::new());
    }
    let Some(table) = entry.as_table_like_mut() else {
        return;
    };

    match table.get_mut(key) {
        Some(Item::Value(existing)) => {
            let decor = existing.decor().clone();
            *existing = value;
            *existing.decor_mut() = decor;
        }
        Some(item) => *item = Item::Value(value),
        None => {
            table.insert(key, Item::Value(value));
        }
    }
}

fn fallback<T: std::fmt::Debug>(section: &str, key: &str, value: &Value, default: T) -> T {
    warn!(section, key, value = %value, default = ?default, "Unusable setting value, using default");
    default
}

fn read_u64(doc: &Table, section: &str, key: &str, default: u64) -> u64 {
    match lookup(doc, section, key) {
        None => default,
        Some(Value::Integer(n)) if *n >= 0 => *n as u64,
        Some(v @ Value::String(s)) => s.trim().parse().unwrap_or_else(|_| fallback(section, key, v, default)),
        Some(v) => fallback(section, key, v, default),
    }
}

fn read_f64(doc: &Table, section: &str, key: &str, default: f64) -> f64 {
    match lookup(doc, section, key) {
        None => default,
        Some(Value::Float(f)) => *f,
        Some(Value::Integer(n)) => *n as f64,
        Some(v @ Value::String(s)) => s.trim().parse().unwrap_or_else(|_| fallback(section, key, v, default)),
        Some(v) => fallback(section, key, v, default),
    }
}

fn read_bool(doc: &Table, section: &str, key: &str, default: bool) -> bool {
    match lookup(doc, section, key) {
        None => default,
        Some(Value::Boolean(b)) => *b,
        Some(v @ Value::String(s)) => parse_bool(s).unwrap_or_else(|| fallback(section, key, v, default)),
        Some(v) => fallback(section, key, v, default),
    }
}

fn read_string(doc: &Table, section: &str, key: &str, default: &str) -> String {
    match lookup(doc, section, key) {
        None => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Integer(_) | Value::Float(_) | Value::Boolean(_))) => v.to_string(),
        Some(v) => fallback(section, key, v, default.to_string()),
    }
}

/// Boolean spellings accepted in the settings file
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    parse_bool(value).ok_or_else(|| Error::settings_invalid(key, format!("'{}' is not a boolean", value)))
}

fn parse_typed<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::settings_invalid(key, format!("'{}' is not a valid value", value)))
}

/// TOML integers are signed 64-bit
fn to_toml_int(key: &str, n: u64) -> Result<i64> {
    i64::try_from(n).map_err(|_| Error::settings_invalid(key, format!("{} exceeds the largest storable integer", n)))
}

/// Expand ~ and environment variables in paths
pub fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Default settings file content with comments
fn generate_default_settings() -> String {
    r#"# hostprobe settings

[benchmark]
# Square roots summed by each CPU worker
cpu_iterations = 10000000

# Matrix multiplications for the GPU stress run
gpu_iterations = 10000000

# Utilization sampling window in seconds
polling_interval_sec = 1.0

[cpu]
# Sample per-core utilization after the CPU benchmark
monitor_usage = true

[gpu]
# Allow the GPU stress run
enable = true

# auto / nvidia / amd / intel / apple / none
vendor = "auto"

[output]
# Where benchmark results are written
json_path = "results.json"

# Mirror logs into logging.file
log_to_file = false

[logging]
# trace, debug, info, warn, error
level = "info"
file = "logs/hostprobe.log"
json_format = false
"#
    .to_string()
}
