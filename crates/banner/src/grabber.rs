//! Banner grabbing over plain TCP.

use crate::identify::{cve_link, identify};
use anyhow::{anyhow, Context, Result};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// What a service volunteered on connect, plus what we made of it.
#[derive(Debug, Clone)]
pub struct Banner {
    pub port: u16,
    pub raw: String,
    pub service: Option<String>,
    pub version: Option<String>,
    pub cve_link: Option<String>,
}

/// Grabs banners from open ports with a per-step timeout.
pub struct Grabber {
    timeout: Duration,
}

impl Grabber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Connect to `host:port` and read the banner. Services that stay
    /// silent on connect get poked with an HTTP HEAD request.
    pub async fn grab(&self, host: &str, port: u16) -> Result<Banner> {
        let addr = format!("{host}:{port}");
        let mut stream = timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| anyhow!("connect to {addr} timed out"))?
            .with_context(|| format!("connect to {addr} failed"))?;

        let mut buf = vec![0u8; 1024];
        let n = match timeout(self.timeout, stream.read(&mut buf)).await {
            Ok(Ok(n)) if n > 0 => n,
            _ => {
                // Nothing volunteered; probe with HTTP HEAD.
                debug!(port, "no passive banner, sending HEAD probe");
                let head = format!("HEAD / HTTP/1.0\r\nHost: {host}\r\n\r\n");
                timeout(self.timeout, stream.write_all(head.as_bytes()))
                    .await
                    .map_err(|_| anyhow!("banner probe write timed out"))??;
                match timeout(self.timeout, stream.read(&mut buf)).await {
                    Ok(Ok(n)) if n > 0 => n,
                    Ok(Ok(_)) => return Err(anyhow!("empty banner")),
                    Ok(Err(err)) => return Err(err.into()),
                    Err(_) => return Err(anyhow!("banner read timed out")),
                }
            }
        };

        let raw = String::from_utf8_lossy(&buf[..n]).trim().to_string();
        let (service, version) = identify(&raw);
        let cve_link = cve_link(service.as_deref(), version.as_deref());

        Ok(Banner {
            port,
            raw,
            service,
            version,
            cve_link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn grabs_a_volunteered_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream
                .write_all(b"SSH-2.0-OpenSSH_8.9p1 Ubuntu\r\n")
                .await
                .unwrap();
        });

        let banner = Grabber::new(Duration::from_millis(500))
            .grab("127.0.0.1", port)
            .await
            .unwrap();
        assert_eq!(banner.port, port);
        assert_eq!(banner.service.as_deref(), Some("ssh"));
        assert_eq!(banner.version.as_deref(), Some("8.9p1"));
        assert!(banner.cve_link.is_some());
    }

    #[tokio::test]
    async fn quiet_service_gets_the_head_probe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Wait for the HEAD probe before answering.
            let mut req = vec![0u8; 256];
            let n = stream.read(&mut req).await.unwrap();
            assert!(String::from_utf8_lossy(&req[..n]).starts_with("HEAD /"));
            stream
                .write_all(b"HTTP/1.0 200 OK\r\nServer: nginx/1.18.0\r\n\r\n")
                .await
                .unwrap();
        });

        let banner = Grabber::new(Duration::from_millis(500))
            .grab("127.0.0.1", port)
            .await
            .unwrap();
        assert_eq!(banner.service.as_deref(), Some("nginx"));
        assert_eq!(banner.version.as_deref(), Some("1.18.0"));
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = Grabber::new(Duration::from_millis(500))
            .grab("127.0.0.1", port)
            .await;
        assert!(result.is_err());
    }
}
