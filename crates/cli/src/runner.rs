//! Multi-target scan driver.
//!
//! Targets scan concurrently under a bounded pool; only output is
//! serialised, through the print mutex, so one target's block never
//! interleaves with another's.

use crate::args::Cli;
use crate::config::{self, Settings};
use crate::input;
use crate::output::{self, Meta, PortRow, ScanDocument};
use crate::ports;
use anyhow::{Context, Result};
use rand::Rng;
use shrike_banner::{service_for_port, Banner, Grabber};
use shrike_common::{PortReport, PortScanner, ScanError};
use shrike_connect::ConnectScanner;
use shrike_httpprobe::Prober;
use shrike_portscan::{ScanConfig, SynScanner};
use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How many targets scan at once.
const TARGET_CONCURRENCY: usize = 10;

/// Ports where the HTTP probe supersedes plain banner grabbing.
const HTTP_PORTS: [u16; 5] = [80, 443, 8080, 8443, 8888];

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = config::load(&cli)?;
    let targets = input::gather_targets(&cli)?;
    if targets.is_empty() {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    }

    let port_list = ports::resolve_ports(&cli, &settings)?;
    let expanded = shrike_resolver::expand_targets(&targets)?;

    debug!(
        targets = expanded.len(),
        ports = port_list.len(),
        no_syn = settings.no_syn,
        "scan plan"
    );

    let opts = Arc::new(RunOptions {
        settings,
        ports: port_list,
        silent: cli.silent,
        verbose: cli.verbose > 0,
        file: cli.file.clone(),
    });

    let semaphore = Arc::new(Semaphore::new(TARGET_CONCURRENCY));
    let print_lock = Arc::new(Mutex::new(()));
    let mut tasks = Vec::with_capacity(expanded.len());
    for target in expanded {
        let permit = semaphore.clone().acquire_owned().await.unwrap();
        let opts = opts.clone();
        let print_lock = print_lock.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            let outcome = scan_target(&target, &opts, &print_lock).await;
            (target, outcome)
        }));
    }

    let mut total_open = 0usize;
    for task in tasks {
        let (target, outcome) = task.await.context("scan task panicked")?;
        match outcome {
            Ok(open) => total_open += open,
            Err(err) => {
                if is_permission_denied(&err) {
                    eprintln!("{err}");
                    return Ok(ExitCode::from(3));
                }
                eprintln!("error [{target}]: {err:#}");
            }
        }
    }

    if total_open == 0 {
        // Advisory condition, not a failure of the scan itself.
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

struct RunOptions {
    settings: Settings,
    ports: Vec<u16>,
    silent: bool,
    verbose: bool,
    file: Option<std::path::PathBuf>,
}

fn is_permission_denied(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ScanError>(),
        Some(ScanError::PermissionDenied)
    )
}

/// Resolve, scan, enrich, and report a single target. Returns the
/// number of open ports found.
async fn scan_target(target: &str, opts: &RunOptions, print_lock: &Mutex<()>) -> Result<usize> {
    let ip = shrike_resolver::resolve_target(target).await?;
    let settings = &opts.settings;

    // Very large probe sets overflow network buffers at full
    // parallelism.
    let mut concurrency = settings.concurrency;
    if opts.ports.len() > 10_000 && concurrency > 200 {
        concurrency = 200;
    }

    let start = Instant::now();
    let results = scan_ports(ip, &opts.ports, settings, concurrency).await?;
    let duration = output::format_duration(start.elapsed());

    let (rows, open_count) = build_rows(target, &results, settings, opts.verbose).await;

    let rdns = if settings.rdns {
        shrike_resolver::rdns::reverse_lookup(ip).await
    } else {
        None
    };

    let doc = ScanDocument {
        target: target.to_string(),
        ip: ip.to_string(),
        rdns,
        ports: rows,
        meta: Meta {
            scanned: opts.ports.len(),
            open: open_count,
            duration,
        },
    };

    emit(&doc, opts, print_lock).await?;
    Ok(open_count)
}

async fn scan_ports(
    ip: Ipv4Addr,
    port_list: &[u16],
    settings: &Settings,
    concurrency: u32,
) -> Result<Vec<PortReport>> {
    let scanner: Box<dyn PortScanner> = if settings.no_syn {
        Box::new(
            ConnectScanner::new()
                .with_timeout(settings.timeout)
                .with_concurrency(concurrency)
                .with_retries(settings.retries),
        )
    } else {
        let config = ScanConfig::default()
            .with_rate(settings.rate)
            .with_timeout(settings.timeout)
            .with_concurrency(concurrency)
            .with_retries(settings.retries)
            .with_src_port(random_src_port());
        Box::new(SynScanner::new(config))
    };

    info!(%ip, scanner = scanner.name(), ports = port_list.len(), "scanning");
    Ok(scanner.scan(ip, port_list).await?)
}

/// Turn raw reports into display rows, grabbing banners and probing
/// HTTP where asked. Closed and filtered ports only appear in verbose
/// mode.
async fn build_rows(
    host: &str,
    results: &[PortReport],
    settings: &Settings,
    verbose: bool,
) -> (Vec<PortRow>, usize) {
    let grabber = settings.banner.then(|| Grabber::new(settings.timeout));
    let prober = if settings.http {
        Prober::new(Duration::from_secs(5)).ok()
    } else {
        None
    };

    let mut rows = Vec::new();
    let mut open_count = 0usize;
    for report in results {
        if !report.is_open() && !verbose {
            continue;
        }

        let mut row = PortRow {
            port: report.port,
            state: report.state,
            service: service_for_port(report.port).map(str::to_string),
            banner: None,
            tech: Vec::new(),
            cve_link: None,
        };

        if report.is_open() {
            open_count += 1;
            let is_http_port = HTTP_PORTS.contains(&report.port);

            if let Some(grabber) = &grabber {
                if !(is_http_port && prober.is_some()) {
                    match grabber.grab(host, report.port).await {
                        Ok(banner) => {
                            if banner.service.is_some() {
                                row.service = banner.service.clone();
                            }
                            row.banner = banner_text(&banner);
                            row.cve_link = banner.cve_link.clone();
                        }
                        Err(err) => debug!(port = report.port, %err, "banner grab failed"),
                    }
                }
            }

            if let Some(prober) = &prober {
                match prober.probe(host, report.port).await {
                    Ok(http) => {
                        let mut http_info = format!("[{}]", http.status);
                        if let Some(title) = &http.title {
                            http_info.push_str(&format!(" {title:?}"));
                        }
                        if let Some(redirect) = &http.redirect {
                            http_info.push_str(&format!(" -> {redirect}"));
                        }
                        if !http.tech.is_empty() {
                            http_info.push_str(&format!(" ({})", http.tech.join(", ")));
                        }
                        row.banner = Some(match row.banner.take() {
                            Some(existing) => format!("{existing}  {http_info}"),
                            None => http_info,
                        });
                        row.tech = http.tech;
                    }
                    Err(err) => debug!(port = report.port, %err, "http probe failed"),
                }
            }
        }

        rows.push(row);
    }
    (rows, open_count)
}

/// Compact one-line banner: "service/version" when both are known,
/// the bare version, or the first line of the raw banner.
fn banner_text(banner: &Banner) -> Option<String> {
    match (&banner.service, &banner.version) {
        (Some(service), Some(version)) => Some(format!("{service}/{version}")),
        (None, Some(version)) => Some(version.clone()),
        _ => {
            let first = banner.raw.lines().next()?.trim();
            if first.is_empty() {
                return None;
            }
            Some(first.chars().take(60).collect())
        }
    }
}

async fn emit(doc: &ScanDocument, opts: &RunOptions, print_lock: &Mutex<()>) -> Result<()> {
    let _guard = print_lock.lock().await;
    match opts.settings.output.as_str() {
        "json" => match &opts.file {
            Some(path) => output::write_json(path, doc)?,
            None => output::print_json(doc)?,
        },
        "csv" => match &opts.file {
            Some(path) => output::write_csv(path, doc)?,
            None => output::print_csv(doc)?,
        },
        _ => {
            if !opts.silent {
                output::print_header(&doc.target, &doc.ip, VERSION);
            }
            for row in &doc.ports {
                output::print_port(row);
            }
            if let Some(rdns) = &doc.rdns {
                if !opts.silent {
                    output::print_rdns(&doc.ip, rdns);
                }
            }
            if !opts.silent {
                output::print_summary(&doc.meta);
            }
        }
    }
    Ok(())
}

/// Random source port in the ephemeral range the receive filter
/// accepts.
fn random_src_port() -> u16 {
    rand::thread_rng().gen_range(49152..=65535)
}
