//! Runtime configuration loaded from environment variables.
//!
//! DESIGN
//! ======
//! A `.env` file is read first when present (`dotenvy`), then each knob is
//! taken from the process environment. Numeric values that fail to parse fall
//! back to their defaults; values that parse but make no sense (a zero tick
//! rate) are rejected.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clicks::DEFAULT_CLICK_QUEUE_CAPACITY;

const DEFAULT_HTTP_PORT: u16 = 80;
const DEFAULT_WS_PORT: u16 = 8081;
const DEFAULT_TICK_HZ: u32 = 60;
const DEFAULT_ASSET_ROOT: &str = "../frontend/build";

// =============================================================================
// TYPES
// =============================================================================

/// Deployment flavour. Only selects which asset build directory is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    /// Parse a selector value. Surrounding whitespace is ignored, since shell
    /// one-liners like `set NODE_ENV=dev && ...` leave a trailing space.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Some(Self::Dev),
            "prod" | "production" => Some(Self::Prod),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TICK_HZ must be greater than zero")]
    ZeroTickRate,
    #[error("CLICK_QUEUE_CAPACITY must be greater than zero")]
    ZeroClickCapacity,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for static assets (and the `/ws` upgrade route).
    pub http_port: u16,
    /// Port whose root path upgrades to the presence socket.
    pub ws_port: u16,
    pub env: Environment,
    /// Parent of the per-environment asset build directories.
    pub asset_root: PathBuf,
    /// Broadcast ticks per second.
    pub tick_hz: u32,
    /// Maximum clicks queued between two ticks.
    pub click_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            ws_port: DEFAULT_WS_PORT,
            env: Environment::default(),
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            tick_hz: DEFAULT_TICK_HZ,
            click_queue_capacity: DEFAULT_CLICK_QUEUE_CAPACITY,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Load configuration from `.env` (if any) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a knob parses to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!(error = %e, "config: no .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).map_err(|_| ()))
    }

    /// Build a config from an arbitrary key lookup. Split out so tests do not
    /// have to touch the process environment.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, ()>,
    {
        let env = match lookup("APP_ENV").or_else(|()| lookup("NODE_ENV")) {
            Ok(raw) => Environment::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "config: unknown environment selector, using dev");
                Environment::Dev
            }),
            Err(()) => Environment::default(),
        };

        let config = Self {
            http_port: parse_or(&lookup, "HTTP_PORT", DEFAULT_HTTP_PORT),
            ws_port: parse_or(&lookup, "WS_PORT", DEFAULT_WS_PORT),
            env,
            asset_root: lookup("ASSET_ROOT").map_or_else(|()| PathBuf::from(DEFAULT_ASSET_ROOT), PathBuf::from),
            tick_hz: parse_or(&lookup, "TICK_HZ", DEFAULT_TICK_HZ),
            click_queue_capacity: parse_or(&lookup, "CLICK_QUEUE_CAPACITY", DEFAULT_CLICK_QUEUE_CAPACITY),
        };

        if config.tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if config.click_queue_capacity == 0 {
            return Err(ConfigError::ZeroClickCapacity);
        }
        Ok(config)
    }

    /// Delay between the end of one tick and the start of the next.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.tick_hz.max(1)
    }

    /// Directory holding the built client for the selected environment.
    #[must_use]
    pub fn asset_dir(&self) -> PathBuf {
        self.asset_root.join(self.env.as_str())
    }

    /// Icon served at `/favicon.ico`.
    #[must_use]
    pub fn favicon_path(&self) -> PathBuf {
        self.asset_dir().join("assets").join("images").join("cursor.svg")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Result<String, ()>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!(key, value = %raw, "config: unparseable value, using default");
            default
        }),
        Err(()) => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
