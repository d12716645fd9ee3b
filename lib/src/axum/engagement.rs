use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Extension, Json};

use crate::api::MessageResponse;
use crate::axum::extract::User;
use crate::axum::{ConfigExt, DbExt, MetricsExt, Router};
use crate::engagement::{
    post_stats, reconcile_counters, record_view, toggle_like, LikeOutcome, PostCounters,
    PostStats,
};
use crate::metrics::Counter;
use crate::post::find_published;
use crate::{routes, Result};

pub fn router() -> Router {
    Router::new()
        .route(routes::POST_VIEW, post(view))
        .route(routes::POST_STATS, get(stats))
        .route(routes::POST_LIKE, post(like))
        .route(routes::POST_RECONCILE, post(reconcile))
}

/// Counts a view. Identified viewers also count towards unique views, once.
pub async fn view(
    user: Option<User>,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Path(slug): Path<String>,
) -> Result<Json<MessageResponse>> {
    let viewer = user.map(|u| u.id);
    db.call(config.timeouts.standard(), move |db| {
        let post = find_published(db, &slug)?;
        record_view(db, &post, viewer)
    })
    .await?;

    metrics.incr(Counter::PostView);
    Ok(Json(MessageResponse::new("View recorded")))
}

pub async fn stats(
    user: Option<User>,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Path(slug): Path<String>,
) -> Result<Json<PostStats>> {
    let viewer = user.map(|u| u.id);
    let stats = db
        .call(config.timeouts.quick(), move |db| {
            let post = find_published(db, &slug)?;
            post_stats(db, &post, viewer)
        })
        .await?;
    Ok(Json(stats))
}

/// Toggles the caller's like and returns the resulting state.
pub async fn like(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Path(slug): Path<String>,
) -> Result<Json<LikeOutcome>> {
    let user_id = user.id;
    let outcome = db
        .call(config.timeouts.standard(), move |db| {
            let post = find_published(db, &slug)?;
            toggle_like(db, &post, user_id)
        })
        .await?;

    metrics.incr(if outcome.liked {
        Counter::PostLike
    } else {
        Counter::PostUnlike
    });
    Ok(Json(outcome))
}

/// Rebuilds the derived counters of a post from its markers and comments.
pub async fn reconcile(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Path(slug): Path<String>,
) -> Result<Json<PostCounters>> {
    user.require_admin()?;
    let counters = db
        .call(config.timeouts.standard(), move |db| {
            let post = find_published(db, &slug)?;
            reconcile_counters(db, post.id)
        })
        .await?;
    Ok(Json(counters))
}
