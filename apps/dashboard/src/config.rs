use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub export_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            export_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    export_dir: Option<PathBuf>,
}

/// Defaults, then `config_path` if present, then environment variables.
pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warn!(
                path = %config_path.display(),
                error = %err,
                "ignoring unreadable dashboard config"
            ),
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.export_dir {
        settings.export_dir = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("KAM_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("KAM_EXPORT_DIR") {
        settings.export_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("APP__EXPORT_DIR") {
        settings.export_dir = PathBuf::from(v);
    }
}

/// Validates an http(s) base URL and strips trailing slashes so endpoint
/// paths can be appended directly.
pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Settings::default().api_base_url);
    }

    let parsed = Url::parse(raw).with_context(|| format!("invalid API base url '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("API base url '{raw}' must use http or https");
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        bail!("API base url '{raw}' must not carry a query or fragment");
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
