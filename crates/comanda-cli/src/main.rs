use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use comanda_application::{InboundMessage, OrderBot};
use comanda_core::intent::{FallbackClassifier, NoopFallback};
use comanda_infrastructure::{TicketWriter, load_aliases, load_config, load_menu};
use comanda_interaction::CompletionFallback;

#[derive(Parser)]
#[command(name = "comanda")]
#[command(about = "Comanda - conversational ordering bot for a small food business", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the bot from the terminal, playing the customer
    Chat {
        /// Menu file (`DisplayName = price` per line)
        #[arg(long, default_value = "menu.txt")]
        menu: PathBuf,
        /// Synonyms file (`canonicalKey|alias1,alias2,...`)
        #[arg(long, default_value = "synonyms.txt")]
        synonyms: PathBuf,
        /// Directory for tickets and the order counter
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Customer id to simulate
        #[arg(long, default_value = "local")]
        customer: String,
    },
    /// Validate the catalog files and print what was loaded
    Check {
        #[arg(long, default_value = "menu.txt")]
        menu: PathBuf,
        #[arg(long, default_value = "synonyms.txt")]
        synonyms: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat {
            menu,
            synonyms,
            data_dir,
            customer,
        } => chat(menu, synonyms, data_dir, customer).await,
        Commands::Check { menu, synonyms } => check(menu, synonyms),
    }
}

fn check(menu: PathBuf, synonyms: PathBuf) -> Result<()> {
    let catalog = load_menu(&menu).context("menu failed to load")?;
    let aliases = load_aliases(&synonyms, &catalog).context("synonyms failed to load")?;
    println!(
        "{}",
        format!("catálogo OK: {} productos", catalog.len()).green()
    );
    for entry in catalog.entries() {
        println!("  {} — ${}", entry.display_name, entry.price);
    }
    // A quick sanity probe so typos in the synonyms file show up here, not
    // in front of a customer.
    for entry in catalog.entries() {
        if aliases.resolve(&entry.display_name).is_empty() {
            println!(
                "{}",
                format!("  aviso: '{}' no resuelve a ningún alias", entry.display_name).yellow()
            );
        }
    }
    Ok(())
}

async fn chat(menu: PathBuf, synonyms: PathBuf, data_dir: PathBuf, customer: String) -> Result<()> {
    let config = Arc::new(load_config()?);
    let catalog = Arc::new(load_menu(&menu)?);
    let aliases = Arc::new(load_aliases(&synonyms, &catalog)?);
    let sink = Arc::new(TicketWriter::new(
        &data_dir,
        config.business_name.clone(),
        config.eta_minutes,
    ));
    let fallback: Arc<dyn FallbackClassifier> = if config.fallback.enabled {
        Arc::new(CompletionFallback::new(&config.fallback))
    } else {
        Arc::new(NoopFallback)
    };
    let bot = OrderBot::new(catalog, aliases, config.clone(), fallback, sink);

    let mut rl = DefaultEditor::new()?;
    println!(
        "{}",
        format!("=== {} ===", config.business_name)
            .bright_magenta()
            .bold()
    );
    println!(
        "{}",
        "Escribí mensajes como un cliente. \"exit\" para salir.".bright_black()
    );

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }
                let _ = rl.add_history_entry(&line);

                let message = InboundMessage {
                    customer_id: customer.clone(),
                    text: trimmed.to_string(),
                    timestamp: Utc::now(),
                };
                match bot.handle_message(message).await {
                    Ok(replies) => {
                        for reply in replies {
                            for line in reply.text.lines() {
                                println!("{}", line.bright_blue());
                            }
                            println!();
                        }
                    }
                    Err(err) => eprintln!("{}", format!("error: {err}").red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C. Escribí \"exit\" para salir.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}
