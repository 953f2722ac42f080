use std::{str::FromStr, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client_core::{FlagsApi, HttpFlagsClient};
use shared::domain::{FlagKey, OrgId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod console;
mod orgs;
mod repl;
mod view;

use console::{AdminConsole, Command as ConsoleCommand, Step};
use view::{coerce_input, render_definitions, FLAG_PAGE_SIZES};

#[derive(Parser, Debug)]
#[command(about = "Browse organizations and manage their feature flags")]
struct Cli {
    #[arg(long, env = "FLAGS_API_URL", default_value = "http://localhost:4000")]
    api_url: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of organizations.
    Orgs {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = view::DEFAULT_ORG_PAGE_SIZE)]
        page_size: u32,
    },
    /// Show the flag grid for an organization.
    Flags {
        org_id: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Write one flag value. Numeric input is sent as a number.
    Set {
        org_id: String,
        key: String,
        value: String,
    },
    Definitions,
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let client = HttpFlagsClient::new(&cli.api_url)?;
    let api: Arc<dyn FlagsApi> = Arc::new(client.clone());
    let mut console = AdminConsole::new(api);

    match cli.command {
        None => repl::run(&mut console).await?,
        Some(Command::Orgs { page, page_size }) => {
            console.orgs.open(page, page_size).await.map_err(|err| anyhow!(err))?;
            if let Some(error) = console.orgs.error() {
                return Err(anyhow!(error.to_string()));
            }
            info!(
                page = console.orgs.page(),
                total = console.orgs.total(),
                "loaded organizations"
            );
            print!("{}", console.orgs.render(None));
        }
        Some(Command::Flags { org_id, search }) => {
            console.grid.set_search(search);
            console
                .grid
                .set_page_size(FLAG_PAGE_SIZES[FLAG_PAGE_SIZES.len() - 1])
                .map_err(|err| anyhow!(err))?;
            console.session.select_org(Some(OrgId::new(org_id))).await;
            print_step(console.execute(ConsoleCommand::Show).await);
            if let Some(error) = console.session.snapshot().await.error {
                return Err(anyhow!(error));
            }
        }
        Some(Command::Set { org_id, key, value }) => {
            let key = FlagKey::from_str(&key.to_ascii_uppercase())?;
            // A failed load is fine here: writing to an unknown organization creates it.
            console.session.select_org(Some(OrgId::new(org_id))).await;
            console.session.toggle_flag(key, coerce_input(&value)).await?;
            println!("{key} updated");
        }
        Some(Command::Definitions) => {
            print!("{}", render_definitions(&client.fetch_definitions().await?));
        }
        Some(Command::Health) => {
            let health = client.health().await?;
            println!("{} at {}", health.status, health.timestamp.to_rfc3339());
        }
    }
    Ok(())
}

fn print_step(step: Step) {
    if let Step::Output(text) = step {
        print!("{text}");
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
