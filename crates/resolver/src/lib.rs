//! Target expansion and name resolution.
//!
//! Turns the user's target tokens (literal IPv4, CIDR block,
//! hostname) into scannable addresses, and answers reverse lookups
//! for reporting. DNS work runs inside `spawn_blocking` so the
//! resolver never stalls the runtime.

pub mod rdns;

use anyhow::{bail, Context, Result};
use ipnet::Ipv4Net;
use std::net::{Ipv4Addr, ToSocketAddrs};

/// Expand CIDR tokens into individual host addresses; every other
/// token passes through untouched for later resolution.
pub fn expand_targets(targets: &[String]) -> Result<Vec<String>> {
    let mut expanded = Vec::new();
    for token in targets {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token.contains('/') {
            let net: Ipv4Net = token
                .parse()
                .with_context(|| format!("invalid CIDR: {token}"))?;
            expanded.extend(net.hosts().map(|ip| ip.to_string()));
        } else {
            expanded.push(token.to_string());
        }
    }
    if expanded.is_empty() {
        bail!("no targets specified");
    }
    Ok(expanded)
}

/// Resolve one target token to an IPv4 address: literal parse first,
/// DNS otherwise (first A record wins).
pub async fn resolve_target(target: &str) -> Result<Ipv4Addr> {
    if let Ok(ip) = target.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    let name = target.to_string();
    let resolved = tokio::task::spawn_blocking(move || {
        (name.as_str(), 0u16)
            .to_socket_addrs()
            .map(|addrs| {
                addrs
                    .filter_map(|addr| match addr {
                        std::net::SocketAddr::V4(v4) => Some(*v4.ip()),
                        std::net::SocketAddr::V6(_) => None,
                    })
                    .next()
            })
    })
    .await
    .context("blocking DNS resolution failed")?;

    match resolved {
        Ok(Some(ip)) => Ok(ip),
        Ok(None) => bail!("no IPv4 address found for {target}"),
        Err(err) => bail!("cannot resolve {target}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn passthrough_for_plain_tokens() {
        let out = expand_targets(&targets(&["10.0.0.1", "example.com"])).unwrap();
        assert_eq!(out, vec!["10.0.0.1", "example.com"]);
    }

    #[test]
    fn cidr_expands_to_host_addresses() {
        let out = expand_targets(&targets(&["192.168.1.0/30"])).unwrap();
        assert_eq!(out, vec!["192.168.1.1", "192.168.1.2"]);
    }

    #[test]
    fn invalid_cidr_is_an_error() {
        assert!(expand_targets(&targets(&["10.0.0.0/33"])).is_err());
        assert!(expand_targets(&targets(&["not-a-net/24"])).is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(expand_targets(&[]).is_err());
        assert!(expand_targets(&targets(&["", "  "])).is_err());
    }

    #[tokio::test]
    async fn literal_ip_resolves_without_dns() {
        let ip = resolve_target("203.0.113.9").await.unwrap();
        assert_eq!(ip, Ipv4Addr::new(203, 0, 113, 9));
    }

    #[tokio::test]
    async fn localhost_resolves() {
        let ip = resolve_target("localhost").await.unwrap();
        assert!(ip.is_loopback());
    }
}
