//! Command-line surface.

use clap::Parser;

/// Periodically trigger Syncthing folder re-scans and report sync status.
#[derive(Debug, Parser)]
#[command(name = "syncthing-kicker", version, about)]
pub struct Cli {
    /// Check Syncthing folder status once and exit.
    #[arg(long)]
    pub check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_daemon_mode() {
        let cli = Cli::parse_from(["syncthing-kicker"]);
        assert!(!cli.check);
    }

    #[test]
    fn check_flag_parses() {
        let cli = Cli::parse_from(["syncthing-kicker", "--check"]);
        assert!(cli.check);
    }
}
