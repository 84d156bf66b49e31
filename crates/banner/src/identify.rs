//! Banner-to-service identification.

/// Parse the service name and version out of a raw banner string.
pub fn identify(raw: &str) -> (Option<String>, Option<String>) {
    let raw = raw.trim();
    if raw.is_empty() {
        return (None, None);
    }

    let lower = raw.to_lowercase();
    if lower.contains("nginx") {
        return (Some("nginx".into()), extract_version(raw, "nginx/"));
    }
    if lower.contains("apache") {
        return (Some("apache".into()), extract_version(raw, "Apache/"));
    }
    if lower.contains("openssh") {
        return (Some("ssh".into()), extract_version(raw, "OpenSSH_"));
    }
    if lower.contains("microsoft-iis") {
        return (Some("iis".into()), extract_version(raw, "Microsoft-IIS/"));
    }
    if raw.starts_with("220") && lower.contains("postfix") {
        return (Some("smtp".into()), Some("postfix".into()));
    }
    if raw.starts_with("220") && lower.contains("ftp") {
        return (Some("ftp".into()), None);
    }
    if raw.starts_with("220") && lower.contains("smtp") {
        return (Some("smtp".into()), None);
    }

    let service = raw
        .split_whitespace()
        .next()
        .map(|word| word.to_lowercase());
    (service, None)
}

/// NVD search URL for a recognised service.
pub fn cve_link(service: Option<&str>, version: Option<&str>) -> Option<String> {
    let service = service?;
    let query = match version {
        Some(version) => format!("{service}+{version}"),
        None => service.to_string(),
    };
    Some(format!(
        "https://nvd.nist.gov/vuln/search/results?query={query}"
    ))
}

/// Well-known service name for a port, used when no banner is
/// available.
pub fn service_for_port(port: u16) -> Option<&'static str> {
    let service = match port {
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "domain",
        80 => "http",
        110 => "pop3",
        111 => "rpcbind",
        135 => "msrpc",
        139 => "netbios-ssn",
        143 => "imap",
        161 => "snmp",
        389 => "ldap",
        443 => "https",
        445 => "microsoft-ds",
        465 => "smtps",
        587 => "submission",
        636 => "ldaps",
        993 => "imaps",
        995 => "pop3s",
        1080 => "socks",
        1433 => "mssql",
        1723 => "pptp",
        2049 => "nfs",
        2181 => "zookeeper",
        3000 => "http-alt",
        3306 => "mysql",
        3389 => "rdp",
        5000 => "http-alt",
        5432 => "postgresql",
        5601 => "kibana",
        5900 => "vnc",
        6379 => "redis",
        6443 => "kubernetes",
        8000 => "http-alt",
        8080 => "http-proxy",
        8443 => "https-alt",
        8888 => "http-alt",
        9000 => "http-alt",
        9090 => "prometheus",
        9200 => "elasticsearch",
        11211 => "memcached",
        27017 => "mongodb",
        _ => return None,
    };
    Some(service)
}

/// Version string following `prefix`, cut at the first whitespace or
/// parenthesis. "nginx/1.18.0 (Ubuntu)" with prefix "nginx/" yields
/// "1.18.0".
fn extract_version(raw: &str, prefix: &str) -> Option<String> {
    let idx = raw.to_lowercase().find(&prefix.to_lowercase())?;
    let rest = &raw[idx + prefix.len()..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_string())
}
