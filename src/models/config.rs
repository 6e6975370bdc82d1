//! Configuration types for the dashboard.
//!
//! Settings come from (lowest to highest priority) built-in defaults,
//! `/etc/sqdash/config.toml`, the user config file, `SQDASH_*` environment
//! variables and finally command-line flags (applied in `main`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Dashboard configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DashConfig {
    pub system: SystemConfig,

    pub refresh: RefreshConfig,

    pub display: DisplayConfig,

    pub behavior: BehaviorConfig,
}

/// System configuration for paths and environment
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Path to directory containing Slurm binaries (squeue)
    /// If empty or not set, auto-detected via PATH
    pub slurm_bin_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds before a squeue invocation is killed
    pub query_timeout: u64,

    /// Seconds between automatic refreshes (0 = only on `r`)
    pub auto_interval: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            query_timeout: crate::slurm::DEFAULT_QUERY_TIMEOUT.as_secs(),
            auto_interval: 0,
        }
    }
}

/// Minimum allowed query timeout in seconds
const MIN_QUERY_TIMEOUT: u64 = 1;

/// Minimum automatic refresh interval (prevents hammering slurmctld)
const MIN_AUTO_INTERVAL: u64 = 2;

/// Fields in RefreshConfig that require interval validation.
#[derive(Clone, Copy)]
enum RefreshField {
    QueryTimeout,
    AutoInterval,
}

impl RefreshField {
    const fn as_str(self) -> &'static str {
        match self {
            Self::QueryTimeout => "query_timeout",
            Self::AutoInterval => "auto_interval",
        }
    }
}

/// Validate that an interval value meets the minimum requirement.
/// In non-strict mode, corrects invalid values to the default and adds a warning.
/// In strict mode, returns an error for invalid values.
fn validate_interval(
    value: &mut u64,
    field: RefreshField,
    min: u64,
    default: u64,
    strict: bool,
    warnings: &mut Vec<String>,
) -> Result<(), String> {
    if *value < min {
        let field_name = field.as_str();
        let msg = format!("refresh.{field_name} must be at least {min} second(s), got {value}");
        if strict {
            return Err(msg);
        }
        warnings.push(format!("{msg} - using default ({default})"));
        *value = default;
    }
    Ok(())
}

impl RefreshConfig {
    /// Validate refresh configuration values.
    /// Returns a list of warnings for invalid values that were corrected to defaults.
    /// If `strict` is true, returns Err instead of correcting values.
    pub fn validate(&mut self, strict: bool) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();
        let defaults = Self::default();

        validate_interval(
            &mut self.query_timeout,
            RefreshField::QueryTimeout,
            MIN_QUERY_TIMEOUT,
            defaults.query_timeout,
            strict,
            &mut warnings,
        )?;

        // 0 disables the timer; anything else must respect the floor
        if self.auto_interval != 0 {
            validate_interval(
                &mut self.auto_interval,
                RefreshField::AutoInterval,
                MIN_AUTO_INTERVAL,
                defaults.auto_interval,
                strict,
                &mut warnings,
            )?;
        }

        Ok(warnings)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Theme name ("dark" or "light")
    pub theme: String,

    /// Keep only the last N lines of a log file (0 = unlimited)
    pub max_log_lines: usize,

    /// Maximum length for job names before truncation
    pub job_name_max_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            max_log_lines: 0,
            job_name_max_length: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Enable clipboard support
    pub copy_to_clipboard: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            copy_to_clipboard: true,
        }
    }
}

impl DashConfig {
    /// Get the user config file path, respecting XDG_CONFIG_HOME
    ///
    /// Resolution order:
    /// 1. $XDG_CONFIG_HOME/sqdash/config.toml (if XDG_CONFIG_HOME is set)
    /// 2. $HOME/.config/sqdash/config.toml (if HOME is set)
    /// 3. dirs::config_dir()/sqdash/config.toml
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
            && !xdg_config.is_empty()
        {
            return Some(PathBuf::from(xdg_config).join("sqdash/config.toml"));
        }

        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home).join(".config/sqdash/config.toml"));
        }

        dirs::config_dir().map(|dir| dir.join("sqdash/config.toml"))
    }

    /// Load configuration from files and environment.
    ///
    /// Returns the config and any warnings encountered during loading. With
    /// `SQDASH_STRICT_CONFIG=1` the first problem is returned as an error.
    pub fn load() -> Result<(Self, Vec<String>)> {
        let strict = Self::is_strict_mode();
        let mut paths = vec![PathBuf::from("/etc/sqdash/config.toml")];
        if let Some(user_path) = Self::user_config_path() {
            paths.push(user_path);
        }

        let (mut config, mut warnings) = Self::load_files(&paths, strict)?;
        warnings.extend(config.apply_env_overrides(strict)?);

        match config.refresh.validate(strict) {
            Ok(validation_warnings) => warnings.extend(validation_warnings),
            Err(err) => bail!("{err} (SQDASH_STRICT_CONFIG is set - config errors are fatal)"),
        }

        Ok((config, warnings))
    }

    /// Merge the given config files in order, key by key. Missing files are skipped.
    ///
    /// A later file only overrides the keys it actually sets; everything else
    /// keeps the value from earlier files (or the default).
    pub fn load_files(paths: &[PathBuf], strict: bool) -> Result<(Self, Vec<String>)> {
        let mut merged = toml::Table::new();
        let mut warnings = Vec::new();

        for path in paths {
            if let Some(table) = Self::load_config_file(path, strict, &mut warnings)? {
                merge_tables(&mut merged, table);
            }
        }

        let config = toml::Value::Table(merged)
            .try_into::<DashConfig>()
            .context("merged config files do not form a valid config")?;
        Ok((config, warnings))
    }

    /// Check if strict config mode is enabled via SQDASH_STRICT_CONFIG
    fn is_strict_mode() -> bool {
        std::env::var("SQDASH_STRICT_CONFIG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Read one config file as a raw table, collecting warnings on parse errors
    /// but not on missing files. The table is checked against [`DashConfig`]
    /// so a bad file is rejected on its own.
    fn load_config_file(
        path: &Path,
        strict: bool,
        warnings: &mut Vec<String>,
    ) -> Result<Option<toml::Table>> {
        match std::fs::read_to_string(path) {
            Ok(content) => match parse_config_table(&content) {
                Ok(table) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    Ok(Some(table))
                }
                Err(e) => {
                    let msg = format!("Config parse error in '{}': {}", path.display(), e);
                    if strict {
                        bail!("{msg}");
                    }
                    warnings.push(msg);
                    Ok(None)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                let msg = format!("Could not read config '{}': {}", path.display(), e);
                if strict {
                    bail!("{msg}");
                }
                warnings.push(msg);
                Ok(None)
            }
        }
    }

    fn apply_env_overrides(&mut self, strict: bool) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        if let Ok(val) = std::env::var("SQDASH_SLURM_PATH")
            && !val.is_empty()
        {
            let path = PathBuf::from(&val);
            if path.is_dir() {
                self.system.slurm_bin_path = Some(path);
            } else {
                Self::report_env_error(
                    strict,
                    "SQDASH_SLURM_PATH",
                    &val,
                    "not a valid directory",
                    &mut warnings,
                )?;
            }
        }

        if let Ok(val) = std::env::var("SQDASH_QUERY_TIMEOUT") {
            match val.parse::<u64>() {
                Ok(secs) => self.refresh.query_timeout = secs,
                Err(_) => Self::report_env_error(
                    strict,
                    "SQDASH_QUERY_TIMEOUT",
                    &val,
                    "expected a positive integer (seconds)",
                    &mut warnings,
                )?,
            }
        }

        if let Ok(val) = std::env::var("SQDASH_AUTO_REFRESH") {
            match val.parse::<u64>() {
                Ok(secs) => self.refresh.auto_interval = secs,
                Err(_) => Self::report_env_error(
                    strict,
                    "SQDASH_AUTO_REFRESH",
                    &val,
                    "expected a non-negative integer (seconds)",
                    &mut warnings,
                )?,
            }
        }

        if let Ok(val) = std::env::var("SQDASH_MAX_LOG_LINES") {
            match val.parse::<usize>() {
                Ok(lines) => self.display.max_log_lines = lines,
                Err(_) => Self::report_env_error(
                    strict,
                    "SQDASH_MAX_LOG_LINES",
                    &val,
                    "expected a non-negative integer",
                    &mut warnings,
                )?,
            }
        }

        if let Ok(val) = std::env::var("SQDASH_THEME") {
            self.display.theme = val;
        }
        if std::env::var("SQDASH_NO_CLIPBOARD").is_ok() {
            self.behavior.copy_to_clipboard = false;
        }

        Ok(warnings)
    }

    /// Report an environment variable error; fatal in strict mode
    fn report_env_error(
        strict: bool,
        var_name: &str,
        value: &str,
        reason: &str,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        if strict {
            bail!("Invalid value '{value}' for {var_name}: {reason} (SQDASH_STRICT_CONFIG is set)");
        }
        warnings.push(format!("Invalid value '{value}' for {var_name}, {reason} - using default"));
        Ok(())
    }
}

/// Parse a config file into a table, rejecting anything `DashConfig` would not accept.
fn parse_config_table(content: &str) -> Result<toml::Table, toml::de::Error> {
    let table = toml::from_str::<toml::Table>(content)?;
    DashConfig::deserialize(toml::Value::Table(table.clone()))?;
    Ok(table)
}

/// Overlay `overlay` onto `base`; nested tables merge, other values replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_refresh_config_validate_defaults() {
        let mut config = RefreshConfig::default();
        let warnings = config.validate(false).unwrap();
        assert!(warnings.is_empty(), "No warnings expected for defaults");
    }

    #[test]
    fn test_refresh_config_validate_zero_timeout() {
        let mut config = RefreshConfig {
            query_timeout: 0,
            auto_interval: 0,
        };

        let warnings = config.validate(false).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("query_timeout"));
        assert!(warnings[0].contains("at least 1"));
        assert_eq!(config.query_timeout, RefreshConfig::default().query_timeout);
    }

    #[test]
    fn test_refresh_config_auto_interval_zero_disables() {
        let mut config = RefreshConfig {
            query_timeout: 10,
            auto_interval: 0,
        };
        assert!(config.validate(false).unwrap().is_empty());
    }

    #[test]
    fn test_refresh_config_auto_interval_too_small() {
        let mut config = RefreshConfig {
            query_timeout: 10,
            auto_interval: 1,
        };
        let warnings = config.validate(false).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("auto_interval"));
        // Corrected to the default, which disables the timer
        assert_eq!(config.auto_interval, 0);
    }

    #[test]
    fn test_refresh_config_validate_strict_mode_error() {
        let mut config = RefreshConfig {
            query_timeout: 0,
            auto_interval: 0,
        };
        let err = config.validate(true).unwrap_err();
        assert!(err.contains("query_timeout"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DashConfig = toml::from_str(
            r#"
            [display]
            theme = "light"
            max_log_lines = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.display.theme, "light");
        assert_eq!(config.display.max_log_lines, 500);
        assert_eq!(config.display.job_name_max_length, 30);
        assert_eq!(config.refresh.query_timeout, 30);
        assert!(config.behavior.copy_to_clipboard);
    }

    #[test]
    fn test_load_files_merges_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.toml");
        let user = dir.path().join("user.toml");
        std::fs::write(&system, "[system]\nslurm_bin_path = \"/opt/slurm/bin\"\n").unwrap();
        std::fs::write(&user, "[refresh]\nquery_timeout = 5\n").unwrap();

        let (config, warnings) =
            DashConfig::load_files(&[system, user, dir.path().join("missing.toml")], false)
                .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            config.system.slurm_bin_path,
            Some(PathBuf::from("/opt/slurm/bin"))
        );
        assert_eq!(config.refresh.query_timeout, 5);
    }

    #[test]
    fn test_user_file_keeps_unset_system_values() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.toml");
        let user = dir.path().join("user.toml");
        std::fs::write(
            &system,
            "[refresh]\nquery_timeout = 90\nauto_interval = 10\n\n[display]\nmax_log_lines = 1000\n",
        )
        .unwrap();
        std::fs::write(&user, "[display]\ntheme = \"light\"\n").unwrap();

        let (config, warnings) = DashConfig::load_files(&[system, user], false).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.refresh.query_timeout, 90);
        assert_eq!(config.refresh.auto_interval, 10);
        assert_eq!(config.display.max_log_lines, 1000);
        assert_eq!(config.display.theme, "light");
        assert_eq!(config.display.job_name_max_length, 30);
    }

    #[test]
    fn test_load_files_rejects_bad_types_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.toml");
        let user = dir.path().join("user.toml");
        std::fs::write(&system, "[refresh]\nquery_timeout = 45\n").unwrap();
        std::fs::write(&user, "[refresh]\nquery_timeout = \"soon\"\n").unwrap();

        let (config, warnings) = DashConfig::load_files(&[system, user], false).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(config.refresh.query_timeout, 45);
    }

    #[test]
    fn test_load_files_parse_error_is_warning() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[refresh\nquery_timeout = ").unwrap();

        let (config, warnings) =
            DashConfig::load_files(&[file.path().to_path_buf()], false).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Config parse error"));
        assert_eq!(config.refresh.query_timeout, 30);

        assert!(DashConfig::load_files(&[file.path().to_path_buf()], true).is_err());
    }
}
