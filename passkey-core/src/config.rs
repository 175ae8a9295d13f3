//! Pipeline configuration.
//!
//! Loaded from environment variables with sensible defaults. The decode and
//! encode stages are pure; the only tunables are how strictly unknown COSE
//! key types are treated and how long receipt polling may run.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the COSE key decoder treats a key type it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyTypePolicy {
    /// Keep decoding; the key carries only its raw type code.
    #[default]
    Lenient,
    /// Fail with `UnsupportedKeyType`.
    Strict,
}

impl FromStr for KeyTypePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown key type policy: {other}")),
        }
    }
}

/// Bounds for waiting on an external confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Retries after the first probe (total probes = `max_retries + 1`)
    pub max_retries: u32,
    /// Delay between two probes
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_retries: 50,
            interval: Duration::from_secs(1),
        }
    }
}

/// Configuration shared by the decoders and the poller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub key_type_policy: KeyTypePolicy,
    pub poll: PollPolicy,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PASSKEY_KEY_TYPE_POLICY`: `lenient` (default) or `strict`
    /// - `PASSKEY_POLL_MAX_RETRIES`: default 50
    /// - `PASSKEY_POLL_INTERVAL_MS`: default 1000
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let key_type_policy = lookup("PASSKEY_KEY_TYPE_POLICY")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.key_type_policy);

        let max_retries = lookup("PASSKEY_POLL_MAX_RETRIES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.poll.max_retries);

        let interval = lookup("PASSKEY_POLL_INTERVAL_MS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll.interval);

        Self {
            key_type_policy,
            poll: PollPolicy {
                max_retries,
                interval,
            },
        }
    }

    pub fn with_key_type_policy(mut self, policy: KeyTypePolicy) -> Self {
        self.key_type_policy = policy;
        self
    }
}
