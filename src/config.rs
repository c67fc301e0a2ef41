use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Port the service listens on unless `PORT` overrides it.
pub const DEFAULT_PORT: u16 = 3000;

/// Translations root, relative to the working directory.
pub const DEFAULT_TRANSLATIONS_DIR: &str = "resources/translations";

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: IpAddr,
    pub port: u16,

    // Translations
    pub translations_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: match std::env::var("HOST") {
                Ok(value) => value
                    .parse()
                    .with_context(|| format!("HOST is not an IP address: {}", value))?,
                Err(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            },
            port: match std::env::var("PORT") {
                Ok(value) => value
                    .parse()
                    .with_context(|| format!("PORT is not a valid port: {}", value))?,
                Err(_) => DEFAULT_PORT,
            },

            translations_dir: std::env::var("TRANSLATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TRANSLATIONS_DIR)),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            translations_dir: PathBuf::from(DEFAULT_TRANSLATIONS_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("TRANSLATIONS_DIR");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().expect("Should load defaults");

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.translations_dir, PathBuf::from("resources/translations"));
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("HOST", "127.0.0.1");
        std::env::set_var("PORT", "8081");
        std::env::set_var("TRANSLATIONS_DIR", "/srv/translations");

        let config = Config::from_env().expect("Should load overrides");
        clear_env();

        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8081");
        assert_eq!(config.translations_dir, PathBuf::from("/srv/translations"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_port() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");

        let result = Config::from_env();
        clear_env();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PORT"));
    }

    #[test]
    fn test_default_matches_from_env_defaults() {
        let config = Config::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.translations_dir, PathBuf::from(DEFAULT_TRANSLATIONS_DIR));
    }
}
