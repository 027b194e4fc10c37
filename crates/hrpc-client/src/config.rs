//! Upstream address + timeout, one pair per dependency.

use std::time::Duration;

use serde::Deserialize;

use hrpc_core::error::{Error, Result};

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base address, e.g. `http://cart:8080`. A bare `host:port` gets `http://`.
    pub addr: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl ClientConfig {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Read `<PREFIX>_ADDR` (required) and `<PREFIX>_TIMEOUT` (seconds).
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, DEFAULT_TIMEOUT, |k| std::env::var(k).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injected lookup and a
    /// per-caller default timeout.
    ///
    /// A missing address is an error. A missing, unparsable or non-positive
    /// timeout falls back to `default_timeout`.
    pub fn from_lookup<F>(prefix: &str, default_timeout: Duration, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_key = format!("{prefix}_ADDR");
        let addr = lookup(&addr_key)
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{addr_key} environment variable not set")))?;

        let timeout_key = format!("{prefix}_TIMEOUT");
        let timeout = match lookup(&timeout_key) {
            None => default_timeout,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs as u64),
                _ => {
                    tracing::warn!(key = %timeout_key, value = %raw, "invalid timeout, using default");
                    default_timeout
                }
            },
        };

        Ok(Self::new(addr.trim(), timeout))
    }

    pub fn validate(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(Error::Config("client addr must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("client timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Address with a scheme and without a trailing slash.
    pub fn base_url(&self) -> String {
        let addr = self.addr.trim().trim_end_matches('/');
        if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_addr_is_fatal() {
        let err = ClientConfig::from_lookup("CART_SERVICE", DEFAULT_TIMEOUT, env(&[])).unwrap_err();
        assert_eq!(err.kind(), "CONFIG");
        assert!(err.to_string().contains("CART_SERVICE_ADDR"));
    }

    #[test]
    fn timeout_falls_back_to_default() {
        for raw in ["", "abc", "0", "-3"] {
            let cfg = ClientConfig::from_lookup(
                "CART_SERVICE",
                Duration::from_secs(20),
                env(&[("CART_SERVICE_ADDR", "http://cart:8080"), ("CART_SERVICE_TIMEOUT", raw)]),
            )
            .unwrap();
            assert_eq!(cfg.timeout(), Duration::from_secs(20), "raw={raw:?}");
        }
    }

    #[test]
    fn timeout_in_seconds() {
        let cfg = ClientConfig::from_lookup(
            "GREETER_SERVICE",
            DEFAULT_TIMEOUT,
            env(&[("GREETER_SERVICE_ADDR", "greeter:8080/"), ("GREETER_SERVICE_TIMEOUT", "12")]),
        )
        .unwrap();
        assert_eq!(cfg.timeout(), Duration::from_secs(12));
        assert_eq!(cfg.base_url(), "http://greeter:8080");
    }
}
