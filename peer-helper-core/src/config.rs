//! Load config from file and environment.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Helper configuration. File: `$PEER_HELPER_CONFIG`, else
/// ~/.config/peer-helper/config.toml, else /etc/peer-helper/config.toml.
/// Env overrides: PEER_HELPER_LOG, PEER_HELPER_STRICT_PADDING.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log filter when RUST_LOG is unset (default "warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Reject received bitfields with pad bits set (default false).
    #[serde(default)]
    pub strict_padding: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            strict_padding: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid peer-helper config")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parsing {}", path.display()))
    }

    /// Apply env overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("PEER_HELPER_LOG") {
            if !level.trim().is_empty() {
                self.log_level = level.trim().to_string();
            }
        }
        if let Some(s) = lookup("PEER_HELPER_STRICT_PADDING") {
            if let Some(b) = parse_bool(&s) {
                self.strict_padding = b;
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load config: default, then config file (if present), then env vars.
/// A broken config file yields the defaults plus the error, which the caller
/// logs once its subscriber is installed.
pub fn load() -> (Config, Option<anyhow::Error>) {
    let paths = config_paths(
        std::env::var_os("PEER_HELPER_CONFIG").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    );
    load_from(&paths, |k| std::env::var(k).ok())
}

/// [`load`] over an explicit lookup list and env source.
pub fn load_from<F>(paths: &[PathBuf], lookup: F) -> (Config, Option<anyhow::Error>)
where
    F: Fn(&str) -> Option<String>,
{
    let (mut c, err) = match find_file(paths) {
        Some(path) => match Config::from_file(path) {
            Ok(c) => (c, None),
            Err(e) => (Config::default(), Some(e)),
        },
        None => (Config::default(), None),
    };
    c.apply_env(lookup);
    (c, err)
}

/// Lookup order: explicit override, then the user's config dir, then /etc.
fn config_paths(config_override: Option<PathBuf>, home: Option<PathBuf>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(p) = config_override {
        out.push(p);
    }
    if let Some(h) = home {
        out.push(h.join(".config/peer-helper/config.toml"));
    }
    out.push(PathBuf::from("/etc/peer-helper/config.toml"));
    out
}

fn find_file(paths: &[PathBuf]) -> Option<&Path> {
    paths.iter().map(PathBuf::as_path).find(|p| p.exists())
}
