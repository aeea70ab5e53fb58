use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Server configuration loaded from environment variables.
///
/// | Env Var          | Default                 |
/// |------------------|-------------------------|
/// | `HOST`           | `127.0.0.1`             |
/// | `PORT`           | `3000`                  |
/// | `TODO_DATA_FILE` | unset (memory only)     |
/// | `CORS_ORIGINS`   | `http://localhost:5173` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_file: Option<PathBuf>,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so parsing is testable without
    /// touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());

        let port: u16 = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a valid u16, got {raw:?}"))?,
            None => 3000,
        };

        let data_file = lookup("TODO_DATA_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            data_file,
            cors_origins,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("HOST must be an IP address, got {:?}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        let methods = [Method::GET, Method::POST, Method::PATCH, Method::DELETE];
        if self.cors_origins.iter().any(|origin| origin == "*") {
            return Ok(CorsLayer::new()
                .allow_origin(AllowOrigin::any())
                .allow_methods(methods)
                .allow_headers([CONTENT_TYPE]));
        }

        let origins = self
            .cors_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin {origin:?}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(methods)
            .allow_headers([CONTENT_TYPE]))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.data_file.is_none());
        assert_eq!(config.cors_origins, vec!["http://localhost:5173".to_string()]);
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("TODO_DATA_FILE", "/tmp/todos.json"),
            ("CORS_ORIGINS", "http://a.test, ,http://b.test"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/todos.json")));
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(config.cors_layer().is_ok());
    }

    #[test]
    fn wildcard_origin_allows_any() {
        let config = ServerConfig::from_lookup(lookup(&[("CORS_ORIGINS", "*")])).unwrap();
        assert!(config.cors_layer().is_ok());
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn blank_data_file_means_memory_only() {
        let config = ServerConfig::from_lookup(lookup(&[("TODO_DATA_FILE", "  ")])).unwrap();
        assert!(config.data_file.is_none());
    }
}
