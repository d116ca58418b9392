//! Server configuration from environment variables.
//!
//! - `HOST`: bind host (default: 0.0.0.0)
//! - `PORT`: bind port (default: 5000)
//! - `TEMP_DIR`: directory for request-scoped uploads (default: ./tempFiles/)
//! - `MAX_UPLOAD_FILES`: upload count limit per request, clamped to 1..=5
//!   (default: 5)
//!
//! Repository selection is configured separately, see [`crate::db::factory`].

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::services::DEFAULT_TEMP_DIR;
use crate::tracks::MAX_TRACK_FILES;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
/// Request body limit, matching the 50 MB accepted by the web client.
pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub temp_dir: PathBuf,
    pub max_upload_files: usize,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            max_upload_files: MAX_TRACK_FILES,
            body_limit_bytes: BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the environment.
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let temp_dir = std::env::var_os("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.temp_dir);
        let max_upload_files = std::env::var("MAX_UPLOAD_FILES")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .map(|n| n.clamp(1, MAX_TRACK_FILES))
            .unwrap_or(defaults.max_upload_files);

        Self {
            host,
            port,
            temp_dir,
            max_upload_files,
            body_limit_bytes: defaults.body_limit_bytes,
        }
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.temp_dir, PathBuf::from("./tempFiles/"));
        assert_eq!(config.max_upload_files, 5);
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn test_bad_host_is_an_error() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.bind_addr().is_err());
    }
}
