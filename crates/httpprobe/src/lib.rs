//! HTTP probing of open ports.
//!
//! One GET per scheme, redirects left unfollowed, certificates
//! unverified: the goal is fingerprinting, not browsing. Returns
//! status, page title, server header, redirect target, and any
//! technology headers worth noting.

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, LOCATION, SERVER};
use std::time::Duration;

/// Outcome of probing one host:port over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpInfo {
    pub url: String,
    pub status: u16,
    pub title: Option<String>,
    pub server: Option<String>,
    pub redirect: Option<String>,
    pub tech: Vec<String>,
}

pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Probe `host:port`, trying the likelier scheme first and the
    /// other one on failure.
    pub async fn probe(&self, host: &str, port: u16) -> Result<HttpInfo> {
        let schemes: [&str; 2] = if port == 443 || port == 8443 {
            ["https", "http"]
        } else {
            ["http", "https"]
        };

        let mut last_err = None;
        for scheme in schemes {
            let url = format!("{scheme}://{host}:{port}");
            match self.client.get(&url).send().await {
                Ok(response) => return Ok(collect(url, response).await),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.map_or_else(|| anyhow!("no scheme attempted"), Into::into))
    }
}

async fn collect(url: String, response: reqwest::Response) -> HttpInfo {
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let server = header_value(&headers, SERVER.as_str());
    let redirect = header_value(&headers, LOCATION.as_str());
    let tech = extract_tech(&headers);

    let body = response.text().await.unwrap_or_default();
    let title = extract_title(head_of(&body));

    HttpInfo {
        url,
        status,
        title,
        server,
        redirect,
        tech,
    }
}

/// The first 4 KiB of the body, the only part worth searching for a
/// title. The cutoff backs off to a char boundary so multi-byte pages
/// cannot panic the slice.
fn head_of(body: &str) -> &str {
    let mut cutoff = body.len().min(4096);
    while !body.is_char_boundary(cutoff) {
        cutoff -= 1;
    }
    &body[..cutoff]
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Contents of the first `<title>` tag, truncated to 80 characters.
fn extract_title(body: &str) -> Option<String> {
    let lower = body.to_lowercase();
    let start = lower.find("<title>")? + "<title>".len();
    let end = start + lower[start..].find("</title>")?;
    // Lowercasing can shift byte offsets in non-ASCII bodies; fall
    // back to the lowered text rather than slicing out of bounds.
    let title = body.get(start..end).unwrap_or(&lower[start..end]).trim();
    if title.is_empty() {
        return None;
    }
    Some(title.chars().take(80).collect())
}

/// Technology hints from response headers.
fn extract_tech(headers: &HeaderMap) -> Vec<String> {
    // (header, fixed label; empty = use the header value itself)
    const CHECKS: [(&str, &str); 6] = [
        ("x-powered-by", ""),
        ("x-generator", ""),
        ("x-drupal-cache", "Drupal"),
        ("x-wordpress-cache", "WordPress"),
        ("cf-ray", "Cloudflare"),
        ("x-shopify-stage", "Shopify"),
    ];

    let mut tech = Vec::new();
    for (header, label) in CHECKS {
        if let Some(value) = header_value(headers, header) {
            if label.is_empty() {
                tech.push(value);
            } else {
                tech.push(label.to_string());
            }
        }
    }
    tech
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn title_extraction() {
        assert_eq!(
            extract_title("<html><TITLE> Admin Panel </TITLE></html>"),
            Some("Admin Panel".to_string())
        );
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
        assert_eq!(extract_title("<title>never closed"), None);
        assert_eq!(extract_title("<title>  </title>"), None);

        let long = format!("<title>{}</title>", "x".repeat(200));
        assert_eq!(extract_title(&long).unwrap().len(), 80);
    }

    #[test]
    fn tech_headers_map_to_labels() {
        let mut headers = HeaderMap::new();
        headers.insert("x-powered-by", HeaderValue::from_static("PHP/8.2"));
        headers.insert("cf-ray", HeaderValue::from_static("8a1b2c3d4e5f"));

        let tech = extract_tech(&headers);
        assert_eq!(tech, vec!["PHP/8.2".to_string(), "Cloudflare".to_string()]);
    }

    #[test]
    fn no_tech_headers_yields_empty() {
        assert!(extract_tech(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn body_cutoff_respects_char_boundaries() {
        // A 3-byte char straddling the 4096-byte mark must not panic
        // the truncation.
        let mut body = "x".repeat(4095);
        body.push_str("日本語のページ");
        let head = head_of(&body);
        assert!(head.len() <= 4096);
        assert!(body.starts_with(head));

        assert_eq!(head_of("short"), "short");
        assert_eq!(head_of(""), "");
    }

    #[tokio::test]
    async fn probe_hits_a_local_server() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut req = vec![0u8; 1024];
            let _ = stream.read(&mut req).await;
            stream
                .write_all(
                    b"HTTP/1.1 200 OK\r\nServer: nginx\r\nX-Powered-By: PHP/8.2\r\n\
                      Content-Length: 27\r\n\r\n<title>It works</title>\r\n\r\n",
                )
                .await
                .unwrap();
        });

        let prober = Prober::new(Duration::from_secs(2)).unwrap();
        let info = prober.probe("127.0.0.1", port).await.unwrap();
        assert_eq!(info.status, 200);
        assert_eq!(info.server.as_deref(), Some("nginx"));
        assert_eq!(info.title.as_deref(), Some("It works"));
        assert_eq!(info.tech, vec!["PHP/8.2".to_string()]);
    }
}
