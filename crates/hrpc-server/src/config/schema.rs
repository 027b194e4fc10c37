use serde::Deserialize;
use hrpc_core::error::{Error, Result};

use crate::{ops, services};

const MIN_BODY_BYTES: usize = 1024;
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default = "default_services")]
    pub services: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            services: default_services(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(Error::UnsupportedVersion);
        }
        if self.services.is_empty() {
            return Err(Error::BadRequest("services must not be empty".into()));
        }
        for name in &self.services {
            self.server.check_service_name(name)?;
            if !services::KNOWN.contains(&name.as_str()) {
                return Err(Error::BadRequest(format!(
                    "unknown service {name:?} (known: {})",
                    services::KNOWN.join(", ")
                )));
            }
        }

        self.server.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Long-lived HTTP listener.
    #[default]
    Http,
    /// One JSON event on stdin, one JSON response on stdout.
    Serverless,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub mode: Mode,

    /// Prefix for RPC routes; `/` mounts them at the root.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            mode: Mode::default(),
            base_path: default_base_path(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !self.base_path.starts_with('/') {
            return Err(Error::BadRequest("server.base_path must start with '/'".into()));
        }
        if self.base_path.contains(':') || self.base_path.contains('*') {
            return Err(Error::BadRequest(
                "server.base_path must not contain route parameters".into(),
            ));
        }
        if !(MIN_BODY_BYTES..=MAX_BODY_BYTES).contains(&self.max_body_bytes) {
            return Err(Error::BadRequest(format!(
                "server.max_body_bytes must be between {MIN_BODY_BYTES} and {MAX_BODY_BYTES}"
            )));
        }
        Ok(())
    }

    /// Reject a service name that an ops route would shadow at the root.
    pub fn check_service_name(&self, name: &str) -> Result<()> {
        if self.route_prefix().is_none() && ops::RESERVED_PATHS.contains(&name) {
            return Err(Error::BadRequest(format!(
                "service name {name:?} is reserved for ops routes unless server.base_path is set"
            )));
        }
        Ok(())
    }

    /// Base path without a trailing slash; `None` when routes live at the root.
    pub fn route_prefix(&self) -> Option<&str> {
        let p = self.base_path.trim_end_matches('/');
        if p.is_empty() {
            None
        } else {
            Some(p)
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_base_path() -> String {
    "/".into()
}
fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}
fn default_services() -> Vec<String> {
    services::KNOWN.iter().map(|s| s.to_string()).collect()
}
