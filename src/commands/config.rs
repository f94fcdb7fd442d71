use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};

use crate::bling::DEFAULT_API_URL;
use crate::retry::{RETRY_DELAY_SECS, RetryPolicy};
use crate::runtime::Runtime;

/// Environment variable holding the Bling bearer token.
pub const TOKEN_ENV: &str = "BLING_TOKEN";

/// Default ceiling for every HTTP call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Values given on the command line; anything left `None` falls back to
/// the environment or a default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub retry_delay_secs: Option<u64>,
}

/// Resolved settings shared by every command.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub token: Option<String>,
    pub api_url: String,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let token = overrides
            .token
            .or_else(|| runtime.env_var(TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty());

        match &token {
            Some(t) => debug!("Using {} for authentication: {}", TOKEN_ENV, mask_token(t)),
            None => warn!(
                "{} is not set, requests will be sent without authentication",
                TOKEN_ENV
            ),
        }

        let output_dir = match overrides.output_dir {
            Some(dir) => dir,
            None => runtime.current_dir()?,
        };

        Ok(Self {
            token,
            api_url: overrides.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            output_dir,
            timeout: Duration::from_secs(overrides.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            retry: RetryPolicy::with_delay(Duration::from_secs(
                overrides.retry_delay_secs.unwrap_or(RETRY_DELAY_SECS),
            )),
        })
    }
}

/// Shows only the ends of a token, e.g. `abcd****wxyz`.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
