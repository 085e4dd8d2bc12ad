//! `pharmabot` console: chat with the pharmaceutical assistant and search
//! the Vidal and Meddispar bases from a terminal.

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use pharmabot_client::chat::SendOutcome;
use pharmabot_client::client::ClientConfig;
use pharmabot_client::console::{self, Command};
use pharmabot_client::start_pharmabot::{self, Services};

/// Command-line options; unset values come from the environment.
#[derive(Debug, Parser)]
#[command(name = "pharmabot", version, about = "Assistant professionnel - Vidal & Meddispar")]
struct Args {
    /// Backend base address (defaults to $PHARMABOT_API_URL, then http://localhost:8000/api).
    #[arg(long)]
    api_url: Option<String>,

    /// Request timeout in seconds (defaults to $PHARMABOT_TIMEOUT_SECS, then 60).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Number of results returned by /search.
    #[arg(long, default_value_t = 20)]
    search_limit: usize,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let mut config = ClientConfig::from_env().with_search_limit(self.search_limit);
        if let Some(url) = self.api_url {
            config = config.with_base_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    start_pharmabot::init_tracing();
    start_pharmabot::run(args.into_config(), console_loop)
}

async fn console_loop(services: Services) -> anyhow::Result<()> {
    println!("PharmaBot - Assistant pour Pharmaciens");
    println!("{}", console::DISCLAIMER);
    println!("Tapez /help pour la liste des commandes.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("flushing stdout")?;

        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };

        match console::parse_command(&line) {
            Command::Empty => {}
            Command::Chat(text) => {
                if let SendOutcome::Skipped(reason) = services.chat.send(&text).await {
                    tracing::debug!("Message skipped: {reason:?}");
                    continue;
                }
                if let Some(reply) = services.chat.snapshot().history().last() {
                    println!("{}\n", console::format_message(reply));
                }
            }
            Command::Search(query) => {
                let outcome = services.search.search(&query).await;
                println!("{}\n", console::format_search(&outcome));
            }
            Command::Clear => {
                services.chat.clear().await;
                println!("Conversation effacée.\n");
            }
            Command::Stats => match services.client.search_stats().await {
                Ok(stats) => println!("{}\n", console::format_stats(&stats)),
                Err(e) => println!("Statistiques indisponibles : {e}\n"),
            },
            Command::Health => {
                for (label, result) in [
                    ("health", services.client.health().await),
                    ("status", services.client.status().await),
                ] {
                    match result {
                        Ok(body) => println!("{label}: {body:#}"),
                        Err(e) => println!("{label}: indisponible ({e})"),
                    }
                }
                println!();
            }
            Command::Help => println!("{}\n", console::HELP),
            Command::Quit => break,
            Command::Unknown(cmd) => println!("Commande inconnue : {cmd} (tapez /help)\n"),
        }
    }

    Ok(())
}
