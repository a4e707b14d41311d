use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEV_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client configuration loaded from environment variables.
///
/// `API_BASE_URL` and `GOOGLE_CLIENT_ID` can also be baked in at build time;
/// a runtime value always wins over the compiled-in one.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub google_client_id: String,
    pub session_file: PathBuf,
    pub request_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let request_timeout_secs = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Config {
            api_base_url: resolve_api_base_url(
                std::env::var("API_BASE_URL").ok(),
                option_env!("API_BASE_URL"),
                cfg!(debug_assertions),
            )?,
            google_client_id: std::env::var("GOOGLE_CLIENT_ID")
                .ok()
                .or_else(|| option_env!("GOOGLE_CLIENT_ID").map(String::from))
                .unwrap_or_default(),
            session_file: match std::env::var("SESSION_FILE") {
                Ok(path) => PathBuf::from(path),
                Err(_) => default_session_file()?,
            },
            request_timeout: Duration::from_secs(request_timeout_secs),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Picks the backend origin: runtime override, then build-time value, then the
/// local development server for debug builds.
fn resolve_api_base_url(
    runtime: Option<String>,
    build_time: Option<&str>,
    dev_build: bool,
) -> Result<String> {
    let url = runtime
        .filter(|u| !u.trim().is_empty())
        .or_else(|| build_time.filter(|u| !u.trim().is_empty()).map(String::from));

    match url {
        Some(url) => Ok(url.trim().trim_end_matches('/').to_string()),
        None if dev_build => Ok(DEV_API_BASE_URL.to_string()),
        None => bail!("Required environment variable 'API_BASE_URL' is not set"),
    }
}

fn default_session_file() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine the user config directory")?;
    Ok(dir.join("resume-bestie").join("session.json"))
}
