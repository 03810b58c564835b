//! memo - Main Entry Point
//!
//! Keeps a journal of daily memos as plain Markdown files.

mod cli;

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use log::{error, info};

use cli::{Cli, Command};
use memo::config::{ensure_config_file, get_config_file_path, load_config};
use memo::error::{Error, Result};
use memo::journal::{format_links, Journal};

/// Application name constant.
const APP_NAME: &str = "memo";

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = load_config();
    if let Some(dir) = cli.base_dir.as_deref() {
        if !settings.apply_base_dir_override(Some(dir)) {
            return Err(Error::Application(format!(
                "Base directory '{}' does not exist",
                dir.display()
            )));
        }
    }
    info!("{} journal at {}", APP_NAME, settings.base_dir.display());

    let journal = Journal::new(settings);
    match cli.command {
        Command::Create { truncate, date } => {
            journal.initialize()?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let path = journal.generate_memo(date, truncate, &mut rand::thread_rng())?;
            journal.weekly_report()?;
            println!("{}", path.display());
        }
        Command::Weekly => {
            journal.initialize()?;
            println!("{}", journal.weekly_report()?.display());
        }
        Command::Tips => {
            journal.initialize()?;
            journal.save_tips()?;
            println!("{}", journal.settings().tips_index_file().display());
        }
        Command::Links => {
            for line in format_links(&journal.links()?) {
                println!("{}", line);
            }
        }
        Command::Config => {
            if ensure_config_file()? {
                info!("Wrote default configuration to {}", get_config_file_path()?.display());
            }
            let text = toml::to_string_pretty(journal.settings())
                .map_err(|e| Error::Application(format!("Failed to print configuration: {}", e)))?;
            print!("{}", text);
        }
    }
    Ok(())
}
