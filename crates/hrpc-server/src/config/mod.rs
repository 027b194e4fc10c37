//! Server config loader (strict parsing + environment overrides).
//!
//! Order: the YAML file named by `HRPC_CONFIG` (defaults when unset), then
//! `PORT`, `RUN_LAMBDA` and `BASE_URL` from the environment, then
//! `validate()`.

pub mod schema;

use std::fs;

use hrpc_core::error::{Error, Result};

pub use schema::{Mode, ServerConfig, ServerSection};

pub const CONFIG_PATH_ENV: &str = "HRPC_CONFIG";

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| Error::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load the process config from the real environment.
pub fn load_from_env() -> Result<ServerConfig> {
    load_with(|k| std::env::var(k).ok())
}

/// Same as [`load_from_env`] with an injected lookup.
pub fn load_with<F>(lookup: F) -> Result<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match lookup(CONFIG_PATH_ENV) {
        Some(path) if !path.trim().is_empty() => load_from_file(path.trim())?,
        _ => ServerConfig::default(),
    };
    apply_env_overrides(&mut cfg, &lookup)?;
    cfg.validate()?;
    Ok(cfg)
}

fn apply_env_overrides<F>(cfg: &mut ServerConfig, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("PORT must be a port number: {e}")))?;
        cfg.server.listen = format!("0.0.0.0:{port}");
    }

    if lookup("RUN_LAMBDA").as_deref().map(str::trim) == Some("1") {
        cfg.server.mode = Mode::Serverless;
    }

    if let Some(base) = lookup("BASE_URL").filter(|b| !b.trim().is_empty()) {
        let base = base.trim();
        if !base.starts_with('/') {
            return Err(Error::Config(format!("BASE_URL must start with '/': {base:?}")));
        }
        cfg.server.base_path = base.to_string();
    }

    Ok(())
}
