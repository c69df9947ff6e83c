//! # Runtime Configuration Module
//!
//! Environment-driven defaults for router behaviour.
//!
//! ## Environment Variables
//!
//! ### `ROUTESHIFT_TRY_SLASHES`
//!
//! When enabled, a request whose path only matches with its trailing slash
//! toggled is answered with a `307 Temporary Redirect` to that path.
//!
//! Default: disabled
//!
//! ### `ROUTESHIFT_CATCH_RAISED_RESPONSES`
//!
//! When enabled, responses raised by handlers become the dispatch result.
//! Disable it for routers nested inside layers that handle raised responses
//! themselves.
//!
//! Default: enabled
//!
//! Both accept `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`. Anything
//! else falls back to the default.
//!
//! ## Usage
//!
//! ```rust
//! use routeshift::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("try_slashes: {}", config.try_slashes);
//! ```

use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Redirect to the slash-toggled path when only that one matches
    pub try_slashes: bool,
    /// Catch responses raised by handlers
    pub catch_raised_responses: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            try_slashes: false,
            catch_raised_responses: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            try_slashes: lookup("ROUTESHIFT_TRY_SLASHES")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.try_slashes),
            catch_raised_responses: lookup("ROUTESHIFT_CATCH_RAISED_RESPONSES")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.catch_raised_responses),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
