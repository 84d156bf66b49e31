//! Output formatting for scan results: human terminal output, JSON,
//! and CSV.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use shrike_common::PortState;
use std::path::Path;
use std::time::Duration;

/// One reportable row of a target's results, enrichment included.
#[derive(Debug, Clone, Serialize)]
pub struct PortRow {
    pub port: u16,
    pub state: PortState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tech: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve_link: Option<String>,
}

/// The full report for one target, as serialised to JSON.
#[derive(Debug, Serialize)]
pub struct ScanDocument {
    pub target: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdns: Option<String>,
    pub ports: Vec<PortRow>,
    pub meta: Meta,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub scanned: usize,
    pub open: usize,
    pub duration: String,
}

pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) == 1 }
}

// ── human ────────────────────────────────────────────────────────────

pub fn print_header(target: &str, ip: &str, version: &str) {
    if !is_tty() {
        return;
    }
    println!();
    print!("{}", format!("shrike v{version}").bold());
    print!("{}", " - target: ".bright_black());
    print!("{}", target.bold());
    if !ip.is_empty() && ip != target {
        print!("{}", format!(" ({ip})").bright_black());
    }
    println!("\n");
    println!(
        "{}",
        format!("{:<8} {:<8} {:<12} {}", "PORT", "STATE", "SERVICE", "BANNER").bright_black()
    );
    println!(
        "{}",
        format!("{:<8} {:<8} {:<12} {}", "----", "-----", "-------", "------").bright_black()
    );
}

pub fn print_port(row: &PortRow) {
    let port_str = format!("{}/tcp", row.port);
    match row.state {
        PortState::Open => {
            let service = row.service.as_deref().unwrap_or("");
            print!(
                "{}",
                format!("{port_str:<8} {:<8} {service:<12}", "open").green().bold()
            );
            if let Some(banner) = &row.banner {
                print!(" {}", banner.yellow());
            }
            println!();
            if let Some(link) = &row.cve_link {
                println!("{}", format!("         -> {link}").bright_black());
            }
        }
        PortState::Filtered => {
            println!("{}", format!("{port_str:<8} {:<8}", "filtered").yellow());
        }
        PortState::Closed => {
            println!("{}", format!("{port_str:<8} {:<8}", "closed").red());
        }
    }
}

pub fn print_rdns(ip: &str, hostname: &str) {
    println!();
    print!("{}", "rdns: ".bright_black());
    println!("{}", format!("{ip} -> {hostname}").cyan());
}

pub fn print_summary(meta: &Meta) {
    if !is_tty() {
        return;
    }
    println!();
    println!("{}", "-----------------------------".bright_black());
    print!("  {}", "scanned : ".bright_black());
    println!("{}", format!("{} ports", meta.scanned).bold());
    print!("  {}", "open    : ".bright_black());
    println!("{}", meta.open.to_string().green().bold());
    print!("  {}", "time    : ".bright_black());
    println!("{}", meta.duration);
    println!("{}", "-----------------------------".bright_black());
    println!();
}

// ── json ─────────────────────────────────────────────────────────────

pub fn print_json(doc: &ScanDocument) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(doc)?);
    Ok(())
}

pub fn write_json(path: &Path, doc: &ScanDocument) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(doc)?)?;
    Ok(())
}

// ── csv ──────────────────────────────────────────────────────────────

pub fn print_csv(doc: &ScanDocument) -> Result<()> {
    print!("{}", render_csv(doc));
    Ok(())
}

pub fn write_csv(path: &Path, doc: &ScanDocument) -> Result<()> {
    std::fs::write(path, render_csv(doc))?;
    Ok(())
}

fn render_csv(doc: &ScanDocument) -> String {
    let mut out = String::from("port,state,service,banner,rdns,cve_link\n");
    let rdns = doc.rdns.as_deref().unwrap_or("");
    for row in &doc.ports {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            row.port,
            row.state,
            csv_field(row.service.as_deref().unwrap_or("")),
            csv_field(row.banner.as_deref().unwrap_or("")),
            csv_field(rdns),
            csv_field(row.cve_link.as_deref().unwrap_or("")),
        ));
    }
    out
}

/// Quote a CSV field when it carries a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ── helpers ──────────────────────────────────────────────────────────

/// Human-readable duration for summaries.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{millis}ms")
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{total_secs}.{millis:03}s")
        } else {
            format!("{total_secs}s")
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{mins}m {secs}s")
        } else {
            format!("{mins}m")
        }
    }
}
