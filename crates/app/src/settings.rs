//! Handles settings for the application. Configuration is written in
//! `settings.toml`.
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the env filter (e.g. `info`, `debug`).
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    /// Store data file for the embedded document backend.
    pub store_path: String,
    /// Accounts file for the file-backed identity fake (ignored when an
    /// `[identity]` section selects the HTTP provider).
    pub accounts_path: Option<String>,
}

/// Remote identity provider; omit the section to use the local fake.
#[derive(Debug, Deserialize)]
pub struct Identity {
    pub base_url: String,
    pub api_key: String,
}

/// SMTP relay for verification mails; omit the section to log instead.
#[derive(Debug, Deserialize)]
pub struct Smtp {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub identity: Option<Identity>,
    pub smtp: Option<Smtp>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
