use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Extension, Json};

use crate::api::{
    CommentListResponse, CommentRequest, CommentResponse, ListParams, MessageResponse,
};
use crate::axum::extract::{Payload, User};
use crate::axum::{ConfigExt, DbExt, MetricsExt, Router};
use crate::db::{Database, PageRequest};
use crate::engagement::{create_comment, delete_comment, list_comments};
use crate::metrics::Counter;
use crate::post::find_published;
use crate::util::parse_id;
use crate::{routes, Comment, Profile, Result, UserId};

pub fn router() -> Router {
    Router::new()
        .route(routes::POST_COMMENTS, get(comments).post(add_comment))
        .route(routes::POST_COMMENT, delete(remove_comment))
}

/// Pairs each comment with its author's name and avatar, loading every
/// distinct author once.
fn with_authors(db: &Database, comments: Vec<Comment>) -> Result<Vec<CommentResponse>> {
    let mut authors: HashMap<UserId, Option<Profile>> = HashMap::new();
    let mut out = Vec::with_capacity(comments.len());
    for comment in comments {
        if !authors.contains_key(&comment.user_id) {
            authors.insert(comment.user_id, db.try_get::<Profile>(comment.user_id)?);
        }
        let author = authors.get(&comment.user_id).and_then(Option::as_ref);
        out.push(CommentResponse::new(comment, author));
    }
    Ok(out)
}

/// Comments on a published post, newest first.
pub async fn comments(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Path(slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<CommentListResponse>> {
    let page = PageRequest::parse(
        params.page.as_deref(),
        params.limit.as_deref(),
        config.pagination.comments_default_limit,
        config.pagination.max_limit,
    );
    let (comments, total) = db
        .call(config.timeouts.standard(), move |db| {
            let post = find_published(db, &slug)?;
            let (comments, total) = list_comments(db, &post, page)?;
            Ok((with_authors(db, comments)?, total))
        })
        .await?;

    Ok(Json(CommentListResponse {
        comments,
        total,
        page: page.page,
        limit: page.limit,
    }))
}

pub async fn add_comment(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Path(slug): Path<String>,
    Payload(request): Payload<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let max_len = config.comments.max_length;
    let author = user.id;
    let comment = db
        .call(config.timeouts.standard(), move |db| {
            let post = find_published(db, &slug)?;
            create_comment(db, &post, author, &request.content, max_len)
        })
        .await?;

    metrics.incr(Counter::CommentCreated);
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::new(comment, Some(&user.profile))),
    ))
}

/// Allowed for the comment's author, the post's author and admins.
pub async fn remove_comment(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    let actor = user.actor();
    db.call(config.timeouts.standard(), move |db| {
        let post = find_published(db, &slug)?;
        delete_comment(db, &post, id, actor)
    })
    .await
    .map_err(|e| e.with_user(actor.user_id))?;

    metrics.incr(Counter::CommentDeleted);
    Ok(Json(MessageResponse::new("Comment deleted")))
}
