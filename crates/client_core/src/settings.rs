use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use url::Url;

pub const SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub event_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8747".into(),
            request_timeout_secs: 15,
            event_capacity: 256,
        }
    }
}

impl ClientSettings {
    /// Server URL with a trailing slash so relative routes join below it.
    pub fn server_base_url(&self) -> Result<Url> {
        let raw = self.server_url.trim();
        if raw.is_empty() {
            return Err(anyhow!("server_url must not be empty"));
        }
        let mut url =
            Url::parse(raw).with_context(|| format!("invalid server_url '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("server_url must start with http:// or https://"));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Joins a server-relative asset reference (such as an avatar path) onto
    /// the server URL.
    pub fn asset_url(&self, reference: &str) -> Result<Url> {
        self.server_base_url()?
            .join(reference.trim_start_matches('/'))
            .with_context(|| format!("invalid asset reference '{reference}'"))
    }
}

/// Defaults, then `client.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub(crate) fn apply_file(settings: &mut ClientSettings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
        Ok(file_cfg) => {
            let lookup = |key: &str| {
                file_cfg.get(key).map(|value| match value {
                    toml::Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
            };
            if let Some(v) = lookup("server_url") {
                settings.server_url = v;
            }
            if let Some(v) = lookup("request_timeout_secs").and_then(|v| v.parse().ok()) {
                settings.request_timeout_secs = v;
            }
            if let Some(v) = lookup("event_capacity").and_then(|v| v.parse().ok()) {
                settings.event_capacity = v;
            }
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings file: {err}");
        }
    }
}

pub(crate) fn apply_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("CHAT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = lookup("APP__EVENT_CAPACITY").and_then(|v| v.parse().ok()) {
        settings.event_capacity = v;
    }
}
