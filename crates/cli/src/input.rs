//! Target intake: stdin pipe, the -t flag, or a file of targets.

use crate::args::Cli;
use anyhow::{bail, Result};
use std::io::BufRead;
use std::path::Path;

/// Collect the raw target tokens for this run. An empty result means
/// no input was given at all (the caller shows usage).
pub fn gather_targets(cli: &Cli) -> Result<Vec<String>> {
    if stdin_is_piped() {
        let stdin = std::io::stdin();
        let targets = read_lines(stdin.lock())?;
        if targets.is_empty() {
            bail!("no targets received from stdin");
        }
        return Ok(targets);
    }

    let Some(target) = &cli.target else {
        return Ok(Vec::new());
    };

    // A slash means CIDR, not a path, unless it ends like a list file.
    if target.contains('/') && !target.ends_with(".txt") {
        return Ok(vec![target.clone()]);
    }

    if Path::new(target).is_file() {
        let file = std::fs::File::open(target)?;
        let targets = read_lines(std::io::BufReader::new(file))?;
        if targets.is_empty() {
            bail!("no targets found in {target}");
        }
        return Ok(targets);
    }

    Ok(vec![target.clone()])
}

fn stdin_is_piped() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) == 0 }
}

/// Non-empty, non-comment lines.
fn read_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_skip_blanks_and_comments() {
        let input = "10.0.0.1\n\n# staging\n  example.com  \n#10.0.0.9\n";
        let lines = read_lines(input.as_bytes()).unwrap();
        assert_eq!(lines, vec!["10.0.0.1", "example.com"]);
    }

    #[test]
    fn file_targets_are_read_line_by_line() {
        let path = std::env::temp_dir().join("shrike-input-test.txt");
        std::fs::write(&path, "192.0.2.1\n# skip\n192.0.2.2\n").unwrap();

        let cli = <Cli as clap::Parser>::parse_from([
            "shrike",
            "-t",
            path.to_str().unwrap(),
        ]);
        // gather_targets consults stdin; only exercise the file branch
        // when the test harness left stdin on a terminal.
        if !stdin_is_piped() {
            let targets = gather_targets(&cli).unwrap();
            assert_eq!(targets, vec!["192.0.2.1", "192.0.2.2"]);
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn cidr_token_is_not_treated_as_a_path() {
        let cli = <Cli as clap::Parser>::parse_from(["shrike", "-t", "10.0.0.0/24"]);
        if !stdin_is_piped() {
            let targets = gather_targets(&cli).unwrap();
            assert_eq!(targets, vec!["10.0.0.0/24"]);
        }
    }
}
