//! Health server.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use crate::error::ApiError;
use crate::health::create_router;

/// Listen address of the health server.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub host: String,
    pub port: u16,
}

impl HealthConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

pub struct HealthServer {
    config: HealthConfig,
}

impl HealthServer {
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    /// Get the server address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Bind the listen address.
    pub async fn bind(&self) -> Result<TcpListener, ApiError> {
        let addr: SocketAddr = self.addr().parse().map_err(|e: std::net::AddrParseError| {
            ApiError::InvalidAddress {
                addr: self.addr(),
                reason: e.to_string(),
            }
        })?;

        TcpListener::bind(addr)
            .await
            .map_err(|source| ApiError::Bind {
                addr: addr.to_string(),
                source,
            })
    }

    /// Serve on an already bound listener until the process exits.
    pub async fn serve(listener: TcpListener) -> Result<(), ApiError> {
        info!("Web server running on {}", listener.local_addr()?);
        axum::serve(listener, create_router()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn test_health_config_default() {
        let config = HealthConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 10000);
    }

    #[test]
    fn test_server_addr_format() {
        let server = HealthServer::new(HealthConfig::new("127.0.0.1", 8080));
        assert_eq!(server.addr(), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_invalid_host() {
        let server = HealthServer::new(HealthConfig::new("not a host", 8080));
        let err = server.bind().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_serves_over_tcp() {
        let server = HealthServer::new(HealthConfig::new("127.0.0.1", 0));
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(HealthServer::serve(listener));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with(crate::HEALTH_BODY));
    }
}
