use std::net::SocketAddr;

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use tokio_util::sync::CancellationToken;

use byline::{Config, Database, Router};

pub fn cmd() -> Command {
    Command::new("serve")
        .display_order(1)
        .about("Start the api server")
        .arg(
            Arg::new("address")
                .long("address")
                .short('a')
                .value_name("ADDR")
                .help("Address to listen on, overrides the config"),
        )
        .arg(
            Arg::new("temporary")
                .long("temporary")
                .num_args(0)
                .help("Run on a throwaway database"),
        )
}

pub async fn run(matches: ArgMatches, mut config: Config, cancel: CancellationToken) -> Result<()> {
    if let Some(address) = matches.get_one::<String>("address") {
        config.address = address.parse::<SocketAddr>()?;
    }
    let db = if matches.get_flag("temporary") {
        Database::temporary()?
    } else {
        Database::from_config(&config)?
    };

    let shutdown = cancel.clone();
    let result = byline::serve(db, Router::new(), config, async move {
        shutdown.cancelled().await
    })
    .await;

    // Let the main task stop waiting if the server went down by itself.
    cancel.cancel();
    Ok(result?)
}
