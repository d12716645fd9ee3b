pub mod auth;
pub mod comment;
pub mod engagement;
pub mod error;
pub mod extract;
pub mod image;
pub mod post;
pub mod profile;
pub mod user;

pub use extract::User;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Extension, Json};
use tower_http::trace::TraceLayer;

use crate::api::HealthResponse;
use crate::metrics::{Collector, Metrics};
use crate::routes;
use crate::{Config, Database, Result};

pub type Router = axum::Router;

pub type ConfigExt<C = Config> = Extension<Arc<C>>;
pub type DbExt = Extension<Arc<Database>>;
pub type MetricsExt = Extension<Arc<dyn Metrics>>;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Registers byline routes on the provided router, all nested under
/// `/api/v1`.
///
/// # Configurable routes
///
/// Route groups (`health`, `auth`, `profile`, `users`, `posts`, `images`,
/// `comments`, `engagement`) can be switched off through `routes.disable`
/// and forced on through `routes.enable`.
pub fn router(router: Router, config: &Config) -> Router {
    let mut api = Router::new();
    api = conditional_merge("health", api, health_router(), config);
    api = conditional_merge("auth", api, auth::router(), config);
    api = conditional_merge("profile", api, profile::router(), config);
    api = conditional_merge("users", api, user::router(), config);
    api = conditional_merge("posts", api, post::router(), config);
    api = conditional_merge("images", api, image::router(), config);
    api = conditional_merge("comments", api, comment::router(), config);
    api = conditional_merge("engagement", api, engagement::router(), config);
    router.nest(routes::API, api)
}

fn conditional_merge(route: &str, routera: Router, routerb: Router, config: &Config) -> Router {
    if config.routes.enable.contains(&route.to_string())
        || !config.routes.disable.contains(&route.to_string())
    {
        routera.merge(routerb)
    } else {
        routera
    }
}

fn health_router() -> Router {
    Router::new().route(routes::HEALTH, get(health))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Registers byline routes and wraps them with the shared state extensions,
/// request tracing and the body size limit.
pub fn app(router: Router, config: Config, db: Database, metrics: Arc<dyn Metrics>) -> Router {
    let body_limit = config.uploads.max_bytes + MULTIPART_OVERHEAD;
    self::router(router, &config)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(metrics))
        .layer(Extension(Arc::new(config)))
        .layer(Extension(Arc::new(db)))
}

/// Registers byline routes on the provided router, initializes application
/// state and starts the web server.
pub async fn start(router: Router, config: Config) -> Result<()> {
    let db = Database::from_config(&config)?;
    start_with(db, router, config).await
}

pub async fn start_with(db: Database, router: Router, config: Config) -> Result<()> {
    serve(db, router, config, std::future::pending()).await
}

/// Same as [`start_with`], returning once `shutdown` resolves and in-flight
/// requests have drained.
pub async fn serve<F>(db: Database, router: Router, config: Config, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    crate::tracing::init(&config).unwrap_or_else(|e| {
        log::warn!("failed to initialize tracing (perhaps it was already initialized?): {e}")
    });

    db.ensure_indexes()?;

    // Provide initial state as defined in config
    crate::init::initialize(&config, &db)?;

    let addr = config.address;
    let metrics: Arc<dyn Metrics> = Arc::new(Collector::default());
    let app = app(router, config, db.clone(), metrics);

    tracing::info!("starting server at {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    db.flush()?;
    tracing::info!("server stopped");
    Ok(())
}
