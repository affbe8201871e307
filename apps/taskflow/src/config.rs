use std::{fs, io, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "taskflow.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    /// `0` disables the per-request timeout.
    pub request_timeout_secs: u64,
    pub notification_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5001".into(),
            request_timeout_secs: 10,
            notification_ttl_secs: 5,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    notification_ttl_secs: Option<u64>,
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.notification_ttl_secs {
            self.notification_ttl_secs = v;
        }
        Ok(())
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("TASKFLOW_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = env("APP__SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
            match v.trim().parse() {
                Ok(parsed) => self.request_timeout_secs = parsed,
                Err(_) => tracing::warn!("ignoring APP__REQUEST_TIMEOUT_SECS={v}"),
            }
        }
        if let Some(v) = env("APP__NOTIFICATION_TTL_SECS") {
            match v.trim().parse() {
                Ok(parsed) => self.notification_ttl_secs = parsed,
                Err(_) => tracing::warn!("ignoring APP__NOTIFICATION_TTL_SECS={v}"),
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("server url must be http or https, got '{}'", url.scheme());
        }
        if self.notification_ttl_secs == 0 {
            bail!("notification_ttl_secs must be at least 1");
        }
        Ok(())
    }
}

/// Defaults, then the config file, then the environment. An explicitly named
/// file must exist; the default `taskflow.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    }

    settings.apply_env(env);
    Ok(settings)
}
