use crate::types::{AggregatorError, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

/// Contents of `~/.gatorconfig.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, alias = "Db_url")]
    pub db_url: String,
    #[serde(default, alias = "Current_user_name", skip_serializing_if = "Option::is_none")]
    pub current_user_name: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or_else(|| AggregatorError::Config("cannot locate home directory".to_string()))
    }

    /// Read the file at `path`. A missing file yields an empty config.
    pub fn read(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, starting empty", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// A loaded config together with where it came from, so changes can be
/// written back.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    config: Config,
}

impl ConfigFile {
    pub fn load(path: PathBuf) -> Result<Self> {
        let config = Config::read(&path)?;
        Ok(Self { path, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_user(&self) -> Option<&str> {
        self.config.current_user_name.as_deref()
    }

    /// Set the active user and persist immediately.
    pub fn set_user(&mut self, name: &str) -> Result<()> {
        self.config.current_user_name = Some(name.to_string());
        self.config.write(&self.path)
    }
}

/// Parse a duration such as `30s`, `1m`, `1h30m`, `1.5h` or `250ms`.
/// Zero and negative durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || AggregatorError::InvalidDuration(input.to_string());

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total_nanos += value * scale;
    }

    if total_nanos < 1.0 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Format a duration the way `parse_duration` reads it, e.g. `1h30m`, `45s`.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_seconds == 0 {
        return format!("{}ms", millis);
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 || millis > 0 || out.is_empty() {
        if millis > 0 {
            out.push_str(&format!("{}.{:03}s", seconds, millis));
        } else {
            out.push_str(&format!("{}s", seconds));
        }
    }
    out
}
