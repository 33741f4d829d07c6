use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = get("PARLEY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!(
                "PARLEY_JWT_SECRET is unset or still a placeholder; it must match the identity service's secret"
            );
        }

        let db_path = get("PARLEY_DB_PATH").unwrap_or_else(|| "parley.db".into());
        let host = get("PARLEY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("PARLEY_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("PARLEY_PORT is not a valid port")?;

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        Ok(Self {
            jwt_secret,
            db_path: db_path.into(),
            addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("PARLEY_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("parley.db"));
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn placeholder_or_missing_secret_is_refused() {
        assert!(load(&[]).is_err());
        assert!(load(&[("PARLEY_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = load(&[("PARLEY_JWT_SECRET", "s3cret"), ("PARLEY_PORT", "http")]);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            ("PARLEY_JWT_SECRET", "s3cret"),
            ("PARLEY_DB_PATH", "/tmp/chat.db"),
            ("PARLEY_HOST", "127.0.0.1"),
            ("PARLEY_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/chat.db"));
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
    }
}
