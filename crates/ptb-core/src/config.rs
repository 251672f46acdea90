use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration for the relay service.
///
/// Everything comes from the environment (with `.env` support) so the bot,
/// the HTTP API and the Firestore adapter can be wired without code changes.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,

    // HTTP API
    pub http_bind: String,

    // Firestore
    pub firestore_project_id: String,
    pub firestore_database_id: String,
    /// Override for the REST endpoint (emulator / tests).
    pub firestore_base_url: Option<String>,
    /// Bearer token for the REST API; absent when talking to an emulator.
    pub firestore_auth_token: Option<String>,

    // Pairing codes
    pub code_ttl: Duration,
    pub code_sweep_interval: Duration,

    // Runtime behavior
    pub bot_reconnect_delay: Duration,
    pub http_client_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let firestore_project_id = env_str("FIRESTORE_PROJECT_ID").unwrap_or_default();
        if firestore_project_id.trim().is_empty() {
            return Err(Error::Config(
                "FIRESTORE_PROJECT_ID environment variable is required".to_string(),
            ));
        }

        let firestore_database_id =
            env_str("FIRESTORE_DATABASE_ID").unwrap_or_else(|| "(default)".to_string());
        let firestore_base_url = env_str("FIRESTORE_BASE_URL").and_then(non_empty);
        let firestore_auth_token = env_str("FIRESTORE_AUTH_TOKEN").and_then(non_empty);

        let port = env_u64("PORT").unwrap_or(3003);
        let http_bind = env_str("HTTP_BIND").unwrap_or_else(|| format!("0.0.0.0:{port}"));

        let code_ttl = Duration::from_secs(env_u64("CODE_TTL_SECS").unwrap_or(300));
        let code_sweep_interval =
            Duration::from_secs(env_u64("CODE_SWEEP_INTERVAL_SECS").unwrap_or(60));

        let bot_reconnect_delay =
            Duration::from_secs(env_u64("BOT_RECONNECT_DELAY_SECS").unwrap_or(5));
        let http_client_timeout =
            Duration::from_secs(env_u64("HTTP_CLIENT_TIMEOUT_SECS").unwrap_or(10));

        Ok(Self {
            telegram_bot_token,
            http_bind,
            firestore_project_id,
            firestore_database_id,
            firestore_base_url,
            firestore_auth_token,
            code_ttl,
            code_sweep_interval,
            bot_reconnect_delay,
            http_client_timeout,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
