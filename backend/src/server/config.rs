use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_JWT_SECRET: &str = "secret-key";

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Accept the fixed demo password for every account.
    #[serde(default = "default_demo_password_bypass")]
    pub demo_password_bypass: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    listen_addr: Option<String>,
    jwt_secret: Option<String>,
    log_dir: Option<String>,
    demo_password_bypass: Option<bool>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_jwt_secret() -> String {
    // Development convenience only; override via JWT_SECRET.
    DEFAULT_JWT_SECRET.to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_demo_password_bypass() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: default_listen_addr(),
            jwt_secret: default_jwt_secret(),
            log_dir: default_log_dir(),
            demo_password_bypass: default_demo_password_bypass(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("jwt_secret must not be empty")]
    EmptySecret,
}

impl ServerConfig {
    /// File values are overridden by environment variables, which are
    /// read after `.env` has been loaded.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let env_config = envy::from_env::<PartialServerConfig>()?;
        Self::merge(config_path, env_config)
    }

    fn merge(config_path: Option<&str>, env_config: PartialServerConfig) -> Result<Self, ConfigError> {
        // 1. Load from file (optional)
        let file_config = match config_path.map(Path::new) {
            Some(path) if path.exists() => Self::read_file(path)?,
            _ => PartialServerConfig::default(),
        };

        // 2. Merge: environment overrides file
        let final_config = ServerConfig {
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            jwt_secret: env_config
                .jwt_secret
                .or(file_config.jwt_secret)
                .unwrap_or_else(default_jwt_secret),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            demo_password_bypass: env_config
                .demo_password_bypass
                .or(file_config.demo_password_bypass)
                .unwrap_or_else(default_demo_password_bypass),
        };

        if final_config.jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(final_config)
    }

    fn read_file(path: &Path) -> Result<PartialServerConfig, ConfigError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = ServerConfig::merge(None, PartialServerConfig::default()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
        assert_eq!(config.log_dir, "logs");
        assert!(config.demo_password_bypass);
        assert!(config.uses_default_secret());
    }

    #[test]
    fn test_file_values_are_used() {
        let file = write_config(
            "listen_addr = \"127.0.0.1:8080\"\njwt_secret = \"from-file\"\ndemo_password_bypass = false\n",
        );
        let config =
            ServerConfig::merge(file.path().to_str(), PartialServerConfig::default()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.jwt_secret, "from-file");
        assert!(!config.demo_password_bypass);
        assert!(!config.uses_default_secret());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config("jwt_secret = \"from-file\"\nlog_dir = \"/var/log/portal\"\n");
        let env = PartialServerConfig {
            jwt_secret: Some("from-env".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::merge(file.path().to_str(), env).unwrap();
        assert_eq!(config.jwt_secret, "from-env");
        assert_eq!(config.log_dir, "/var/log/portal");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ServerConfig::merge(
            Some("/definitely/not/here/portal.toml"),
            PartialServerConfig::default(),
        )
        .unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let file = write_config("listen_addr = [unclosed");
        let err = ServerConfig::merge(file.path().to_str(), PartialServerConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let env = PartialServerConfig {
            jwt_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            ServerConfig::merge(None, env),
            Err(ConfigError::EmptySecret)
        ));
    }
}
