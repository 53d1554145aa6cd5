use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variables predating the `MEDIACONV_` prefix.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("HOST_NAME", "cors.hostname"),
    ("DATABASE_PATH", "database.path"),
];

fn env_providers(figment: Figment) -> Figment {
    figment
        .merge(Env::prefixed("MEDIACONV_").split("__"))
        .merge(
            Env::raw()
                .only(&["HOST_NAME", "DATABASE_PATH"])
                .map(|key| {
                    LEGACY_ENV
                        .iter()
                        .find(|(legacy, _)| key == *legacy)
                        .map(|(_, mapped)| (*mapped).into())
                        .unwrap_or_else(|| key.into())
                }),
        )
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    env_providers(Figment::new().merge(Toml::file(path)))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    env_providers(Figment::new())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::path::PathBuf;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let toml = r#"
[server]
port = "not a port"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/mediaconv.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "mediaconv.toml",
                r#"
[server]
host = "127.0.0.1"
port = 3000

[session]
timeout_secs = 30
"#,
            )?;

            let config = load_config(Path::new("mediaconv.toml")).unwrap();
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.server.host.to_string(), "127.0.0.1");
            assert_eq!(config.session.timeout_secs, 30);
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("mediaconv.toml", "[server]\nport = 3000\n")?;
            jail.set_env("MEDIACONV_SERVER__PORT", "4000");
            jail.set_env("MEDIACONV_CONVERTER__TIMEOUT_SECS", "15");

            let config = load_config(Path::new("mediaconv.toml")).unwrap();
            assert_eq!(config.server.port, 4000);
            assert_eq!(config.converter.timeout_secs, 15);
            Ok(())
        });
    }

    #[test]
    fn test_legacy_env_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("HOST_NAME", "localhost:5173");
            jail.set_env("DATABASE_PATH", "/var/lib/mediaconv/db.sqlite");

            let config = load_config_from_env().unwrap();
            assert_eq!(config.cors.hostname.as_deref(), Some("localhost:5173"));
            assert_eq!(
                config.database.path,
                PathBuf::from("/var/lib/mediaconv/db.sqlite")
            );
            Ok(())
        });
    }

    #[test]
    fn test_load_config_from_env_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_config_from_env().unwrap();
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.session.timeout_secs, 600);
            Ok(())
        });
    }
}
