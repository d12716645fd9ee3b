//! Shortest path to a running blog backend.
//!
//! Starts the api on a temporary database with a seeded admin account, and
//! mounts one extra page next to the byline routes.

use std::str::FromStr;

use axum::routing::get;

use byline::{config, Config, Role};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config {
        address: std::net::SocketAddr::from_str("127.0.0.1:8001")?,
        users: vec![config::User {
            email: "admin@example.com".to_string(),
            password: "change-me".to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
        }],
        dev: config::DevMode {
            enabled: true,
            temporary_db: true,
        },
        ..Default::default()
    };

    // application routes living outside the api
    let router = byline::Router::new().route("/", get(home));

    // attaches byline routes under /api/v1 and serves until interrupted
    byline::start(router, config).await?;

    Ok(())
}

async fn home() -> &'static str {
    "byline is up, try GET /api/v1/blog/posts"
}
