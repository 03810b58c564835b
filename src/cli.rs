//! Command line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Daily memos, rotating tips and weekly reports kept as plain Markdown
#[derive(Parser, Debug)]
#[command(name = "memo", author, version, about, long_about = None)]
pub struct Cli {
    /// Use this existing directory as the journal root
    #[arg(long, global = true, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Generate the daily memo, then refresh the weekly report
    Create {
        /// Overwrite the memo if it already exists
        #[arg(short, long)]
        truncate: bool,

        /// Memo date instead of today (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Regenerate the weekly report
    Weekly,
    /// Regenerate the tips index
    Tips,
    /// Print which memos reference which
    Links,
    /// Print the effective configuration
    Config,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}
