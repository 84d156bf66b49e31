use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shrike")]
#[command(version)]
#[command(about = "Network reconnaissance: fast stateless SYN port scanner", long_about = None)]
#[command(after_help = "\
EXAMPLES:
  shrike -t example.com --top 1000 --banner --rdns
  shrike -t 1.2.3.4 -p 80,443,8080
  shrike -t targets.txt --full -o json -f out.json
  subfinder -d example.com | shrike --banner -o json")]
pub struct Cli {
    /// Target: IP, domain, CIDR, or file path
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// Specific ports: 80,443,8000-8100
    #[arg(short = 'p', long)]
    pub ports: Option<String>,

    /// Scan the top N ports
    #[arg(long)]
    pub top: Option<usize>,

    /// Scan all 65535 ports
    #[arg(long)]
    pub full: bool,

    /// Packets per second (0 = unpaced)
    #[arg(long)]
    pub rate: Option<u32>,

    /// Wait for responses after the last probe, in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Concurrent ports
    #[arg(long)]
    pub concurrency: Option<u32>,

    /// Retries per port
    #[arg(long)]
    pub retries: Option<u32>,

    /// Connect scan instead of SYN; needs no root
    #[arg(long = "no-syn")]
    pub no_syn: bool,

    /// Grab service banners from open ports
    #[arg(long)]
    pub banner: bool,

    /// Probe open ports over HTTP/HTTPS
    #[arg(long)]
    pub http: bool,

    /// Reverse DNS lookup of each target
    #[arg(long)]
    pub rdns: bool,

    /// Output format: human, json, csv
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Save output to a file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Silent mode: results only
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file (default: ~/.shrike.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_typical_invocation() {
        let cli = Cli::parse_from([
            "shrike", "-t", "10.0.0.1", "-p", "80,443", "--rate", "1000", "--banner",
        ]);
        assert_eq!(cli.target.as_deref(), Some("10.0.0.1"));
        assert_eq!(cli.ports.as_deref(), Some("80,443"));
        assert_eq!(cli.rate, Some(1000));
        assert!(cli.banner);
        assert!(!cli.no_syn);
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::parse_from(["shrike", "-t", "10.0.0.1", "-v", "-v"]);
        assert_eq!(cli.verbose, 2);
    }
}
