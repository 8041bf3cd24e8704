//! Terminal output for backup and restore runs
//!
//! Status lines go to stdout, warnings to stderr. The `*_line` helpers build
//! the plain text so it can be checked without a terminal.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use vaultkeep_engines::{MountReport, RunReport};

/// Which direction a run moved secrets in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backup,
    Restore,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Direction::Backup => "Backed up",
            Direction::Restore => "Restored",
        }
    }

    fn arrow(self) -> &'static str {
        match self {
            Direction::Backup => "->",
            Direction::Restore => "<-",
        }
    }
}

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Section title for a run
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// `yes`/`no` setting line, e.g. raw mode
pub fn flag(key: &str, enabled: bool) {
    kv(key, if enabled { "yes" } else { "no" });
}

/// `secret (kv2)  12 keys -> /backups/secret.kv2`
pub fn mount_line(direction: Direction, report: &MountReport) -> String {
    format!(
        "{} ({})  {} {} {} {}",
        report.mount.path,
        report.mount.engine_type,
        report.keys,
        if report.keys == 1 { "key" } else { "keys" },
        direction.arrow(),
        report.dir
    )
}

/// Closing summary for a whole run
pub fn summary_line(direction: Direction, report: &RunReport) -> String {
    format!(
        "{} {} key(s) across {} mount(s)",
        direction.verb(),
        report.total_keys(),
        report.mounts.len()
    )
}

/// Print each mount of a finished run followed by the summary
pub fn report(direction: Direction, report: &RunReport) {
    header(direction.verb());
    for mount in &report.mounts {
        println!("  {} {}", style("•").cyan(), mount_line(direction, mount));
    }
    success(&summary_line(direction, report));
}

/// Spinner shown while waiting on Vault
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
