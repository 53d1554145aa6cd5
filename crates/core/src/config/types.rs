use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::converter::ConverterConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Cross-origin configuration for the browser frontend
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Host the frontend is served from (e.g. "localhost:3000").
    #[serde(default)]
    pub hostname: Option<String>,
}

impl CorsConfig {
    /// Origin allowed to call the API. A bare hostname is served over http.
    pub fn allowed_origin(&self) -> Option<String> {
        let hostname = self.hostname.as_deref()?.trim();
        if hostname.is_empty() {
            return None;
        }
        if hostname.starts_with("http://") || hostname.starts_with("https://") {
            Some(hostname.trim_end_matches('/').to_string())
        } else {
            Some(format!("http://{}", hostname.trim_end_matches('/')))
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("mediaconv.db")
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Seconds of inactivity after which a session and its files are dropped.
    #[serde(default = "default_session_timeout")]
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_session_timeout(),
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_session_timeout() -> u64 {
    600 // 10 minutes
}

/// Upload limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Maximum request body size for uploads, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    256 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "mediaconv.db");
        assert_eq!(config.session.timeout_secs, 600);
        assert_eq!(config.converter.timeout_secs, 60);
        assert!(config.cors.hostname.is_none());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[cors]
hostname = "localhost:3000"

[database]
path = "/data/media.sqlite"

[session]
timeout_secs = 120

[converter]
ffmpeg_path = "/usr/local/bin/ffmpeg"
timeout_secs = 30

[upload]
max_body_bytes = 1024
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cors.hostname.as_deref(), Some("localhost:3000"));
        assert_eq!(config.database.path.to_str().unwrap(), "/data/media.sqlite");
        assert_eq!(config.session.timeout(), Duration::from_secs(120));
        assert_eq!(
            config.converter.ffmpeg_path,
            PathBuf::from("/usr/local/bin/ffmpeg")
        );
        assert_eq!(config.converter.timeout_secs, 30);
        assert_eq!(config.upload.max_body_bytes, 1024);
    }

    #[test]
    fn test_allowed_origin() {
        let mut cors = CorsConfig::default();
        assert_eq!(cors.allowed_origin(), None);

        cors.hostname = Some("localhost:3000".to_string());
        assert_eq!(
            cors.allowed_origin().as_deref(),
            Some("http://localhost:3000")
        );

        cors.hostname = Some("https://media.example.com/".to_string());
        assert_eq!(
            cors.allowed_origin().as_deref(),
            Some("https://media.example.com")
        );

        cors.hostname = Some("   ".to_string());
        assert_eq!(cors.allowed_origin(), None);
    }
}
