//! Environment-driven runtime settings.
//!
//! Recognized variables: `PAGE_ACCESS_TOKEN` (required; authenticates
//! outbound Graph API calls and doubles as the webhook verify token),
//! `PORT` (listen port, default 1337), `LEAFLINE_DATA_DIR` (store
//! location, default `~/.leafline`), and `DATABASE_URL` (overrides the
//! derived SQLite URL). Malformed optional values fall back to their
//! defaults with a warning; only the missing token is fatal.

use std::path::PathBuf;

use secrecy::SecretString;

/// Default listen port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 1337;

/// Runtime configuration resolved from the environment at startup.
pub struct Settings {
    /// Page access token, never logged or Debug-printed.
    pub page_access_token: SecretString,
    pub port: u16,
    /// Data directory holding the SQLite database.
    pub data_dir: PathBuf,
    /// Fully resolved sqlx database URL.
    pub database_url: String,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary variable lookup (testable seam).
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let token = lookup("PAGE_ACCESS_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("PAGE_ACCESS_TOKEN is not set"))?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(port = %raw, "invalid PORT value, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let data_dir = lookup("LEAFLINE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = lookup("HOME").unwrap_or_else(|| ".".to_string());
                PathBuf::from(home).join(".leafline")
            });

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            format!("sqlite://{}?mode=rwc", data_dir.join("leafline.db").display())
        });

        Ok(Self {
            page_access_token: SecretString::from(token),
            port,
            data_dir,
            database_url,
        })
    }
}
