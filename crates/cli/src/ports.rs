//! Port selection: explicit lists, ranges, or the top-N table.

use crate::args::Cli;
use crate::config::Settings;
use anyhow::{anyhow, Context, Result};

/// The list of ports to scan, from `--full`, `-p`, or the top table.
pub fn resolve_ports(cli: &Cli, settings: &Settings) -> Result<Vec<u16>> {
    if cli.full {
        return Ok((1..=65535).collect());
    }
    if let Some(spec) = &cli.ports {
        return parse_ports(spec);
    }
    Ok(top_ports(settings.top))
}

/// Parse a comma-separated list of ports and ranges, e.g.
/// "80,443,8000-8100". Duplicates are dropped, order preserved.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>> {
    let mut ports = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u16 = start
                .trim()
                .parse()
                .with_context(|| format!("invalid port range: {part}"))?;
            let end: u16 = end
                .trim()
                .parse()
                .with_context(|| format!("invalid port range: {part}"))?;
            if start == 0 || start > end {
                return Err(anyhow!("invalid port range: {part}"));
            }
            for port in start..=end {
                if seen.insert(port) {
                    ports.push(port);
                }
            }
        } else {
            let port: u16 = part
                .parse()
                .with_context(|| format!("invalid port: {part}"))?;
            if port == 0 {
                return Err(anyhow!("invalid port: {part}"));
            }
            if seen.insert(port) {
                ports.push(port);
            }
        }
    }

    if ports.is_empty() {
        return Err(anyhow!("no ports specified"));
    }
    Ok(ports)
}

/// The `n` most commonly exposed TCP ports. When `n` exceeds the
/// curated table, the list is padded with low ports upward.
pub fn top_ports(n: usize) -> Vec<u16> {
    let mut top: Vec<u16> = vec![
        80, 443, 22, 21, 25, 53, 110, 143, 445, 3306, 3389, 8080, 8443, 8888, 27017, 6379, 5432,
        1433, 23, 111, 135, 139, 161, 389, 636, 993, 995, 1080, 1723, 2049, 2181, 3000, 4444,
        5000, 5001, 5601, 6000, 6443, 7001, 7777, 8000, 8001, 8008, 8081, 8082, 8083, 8086, 8088,
        8089, 8161, 9000, 9090, 9200, 9300, 9443, 9600, 9999, 10000,
    ];

    if n >= top.len() {
        let existing: std::collections::HashSet<u16> = top.iter().copied().collect();
        let mut candidate = 1u16;
        while top.len() < n && candidate < 65535 {
            if !existing.contains(&candidate) {
                top.push(candidate);
            }
            candidate += 1;
        }
    }

    top.truncate(n);
    top
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_and_multiple() {
        assert_eq!(parse_ports("80").unwrap(), vec![80]);
        assert_eq!(parse_ports("22,80,443").unwrap(), vec![22, 80, 443]);
        assert_eq!(parse_ports(" 80 , 443 ").unwrap(), vec![80, 443]);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_ports("1-3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_ports("22,80-82,443").unwrap(), vec![22, 80, 81, 82, 443]);
    }

    #[test]
    fn duplicates_are_dropped() {
        assert_eq!(parse_ports("80,80,80-81").unwrap(), vec![80, 81]);
    }

    #[test]
    fn invalid_specs_are_rejected() {
        assert!(parse_ports("").is_err());
        assert!(parse_ports(",,,").is_err());
        assert!(parse_ports("abc").is_err());
        assert!(parse_ports("80-").is_err());
        assert!(parse_ports("-80").is_err());
        assert!(parse_ports("90-80").is_err());
        assert!(parse_ports("0").is_err());
        assert!(parse_ports("70000").is_err());
    }

    #[test]
    fn top_truncates_and_pads() {
        assert_eq!(top_ports(3), vec![80, 443, 22]);

        let padded = top_ports(100);
        assert_eq!(padded.len(), 100);
        // Padding never duplicates a curated entry.
        let unique: std::collections::HashSet<u16> = padded.iter().copied().collect();
        assert_eq!(unique.len(), padded.len());
    }
}
