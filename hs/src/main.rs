use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use historystore::HistoryStore;
use historystore::cli::{Cli, Command};
use historystore::config::Config;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.dir.unwrap_or(config.store_path);

    info!("historystore starting");

    let store = HistoryStore::open(&store_path)?;

    match cli.command {
        Command::List => {
            let records = store.list()?;
            if records.is_empty() {
                println!("No history records found");
            } else {
                for (id, record) in records {
                    let request: String = record.original_request.chars().take(60).collect();
                    println!("{} {} {}", id.cyan(), record.department.yellow(), request);
                }
            }
        }
        Command::Show { record_id } => {
            let record = store.get(&record_id)?;
            println!("Record: {}", record_id.cyan());
            println!("  Timestamp: {}", record.timestamp);
            println!("  Department: {}", record.department);
            println!("  Questions answered: {}", record.total_questions);
            println!("  Request: {}", record.original_request);
            println!();
            println!("{}", record.final_prompt);
        }
        Command::Search {
            pattern,
            ignore_case,
            max_results,
        } => {
            let matches = store.search(
                &pattern,
                historystore::SearchOptions {
                    max_results: max_results.unwrap_or(10),
                    case_insensitive: ignore_case,
                },
            )?;
            for m in matches {
                println!("{}:{} {}", m.record_id.yellow(), m.field.dimmed(), m.snippet);
            }
        }
        Command::Stats => {
            let stats = store.stats()?;
            println!("History: {}", store.path().display().to_string().cyan());
            println!("  Records: {}", stats.record_count);
            println!("  Questions answered: {}", stats.total_questions);
            for (department, count) in stats.by_department {
                println!("  {}: {}", department, count);
            }
        }
        Command::Delete { record_id } => {
            store.delete(&record_id)?;
            println!("{} Deleted record: {}", "✓".green(), record_id);
        }
    }

    Ok(())
}
