//! Utility functions shared across the application.

mod secret;

pub use secret::SecretString;

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::warn;

fn parse_addr(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
}

/// Bind a listener, starting from the preferred port.
///
/// This function attempts to bind using the following strategy:
/// 1. Try the preferred port first
/// 2. If unavailable, try the next 10 consecutive ports
/// 3. If all are unavailable, let the OS assign a random available port
///
/// The bound listener is returned so there is no window in which another
/// process can take the port.
pub async fn bind_available(host: &str, preferred: u16) -> std::io::Result<TcpListener> {
    if let Ok(listener) = TcpListener::bind(parse_addr(host, preferred)?).await {
        return Ok(listener);
    }

    for offset in 1..=10 {
        let port = preferred.saturating_add(offset);
        if let Ok(listener) = TcpListener::bind(parse_addr(host, port)?).await {
            warn!(
                preferred,
                actual = port,
                "Preferred port unavailable, using alternate"
            );
            return Ok(listener);
        }
    }

    let listener = TcpListener::bind(parse_addr(host, 0)?).await?;
    warn!(
        preferred,
        actual = listener.local_addr()?.port(),
        "Using OS-assigned port"
    );
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_available_preferred() {
        // Start of dynamic/private port range
        let preferred = 49152;
        let listener = bind_available("127.0.0.1", preferred).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(port > 0);
    }

    #[tokio::test]
    async fn test_bind_available_fallback() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let listener = bind_available("127.0.0.1", taken_port).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), taken_port);
    }

    #[tokio::test]
    async fn test_bind_available_invalid_host() {
        let result = bind_available("invalid-host-format[", 8080).await;
        assert!(result.is_err());
    }
}
