mod reconcile;
mod serve;
mod user;

use std::str::FromStr;
use std::time::Duration;

use clap::{Arg, Command};
use tokio_util::sync::CancellationToken;

use byline::{config, Config};

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &'static str = env!("CARGO_PKG_AUTHORS");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Config found in the working directory is picked up automatically,
    // `--config` points at a different file.
    let mut config: Config = config::load().unwrap_or_default();

    let matches = cmd().get_matches();

    if let Some(config_path) = matches.get_one::<String>("config") {
        config = config::load_from(config_path)?;
    }
    if let Some(level) = matches.get_one::<String>("verbosity") {
        config.tracing.level = byline::tracing::Level::from_str(level)?;
    }

    match matches.subcommand() {
        Some(("serve", m)) => {
            let server = tokio::spawn(serve::run(m.clone(), config, cancel.clone()));

            // Wait for either ctrl_c signal or the server stopping on its own
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("Initiating graceful shutdown...");
                    cancel.cancel();
                },
                _ = cancel.cancelled() => {},
            }
            server.await??;
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Some(("user", m)) => user::run(m, &config)?,
        Some(("reconcile", m)) => reconcile::run(m, &config)?,
        _ => anyhow::bail!("unknown subcommand"),
    }

    Ok(())
}

pub fn cmd() -> Command {
    Command::new("byline")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .infer_subcommands(true)
        .version(VERSION)
        .author(AUTHORS)
        .about("Blogging and profile backend.")
        .subcommand(serve::cmd())
        .subcommand(user::cmd())
        .subcommand(reconcile::cmd())
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Path to the config file"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .display_order(100)
                .value_name("level")
                .value_parser(["trace", "debug", "info", "warn", "error", "none"])
                .global(true)
                .help("Set the verbosity of the log output"),
        )
}
