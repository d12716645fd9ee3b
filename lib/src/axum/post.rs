use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json};

use crate::api::{AuthorInfo, ListParams, MessageResponse, PostListResponse, PostResponse};
use crate::axum::extract::{Payload, User};
use crate::axum::{ConfigExt, DbExt, MetricsExt, Router};
use crate::db::{Database, PageRequest, PostQuery};
use crate::engagement::{purge_post, PostCounterStore};
use crate::metrics::Counter;
use crate::post::{self, NewPost, PostUpdate, Sort};
use crate::{routes, Error, ErrorKind, Post, Profile, Result};

pub fn router() -> Router {
    Router::new()
        .route(routes::BLOG_POSTS, get(list_posts).post(create_post))
        .route(routes::BLOG_POSTS_MINE, get(my_posts))
        .route(
            routes::BLOG_POST,
            get(get_post).put(update_post).delete(delete_post),
        )
}

/// Attaches author details and engagement counters.
pub(crate) fn present(db: &Database, post: Post) -> Result<PostResponse> {
    let author = db
        .try_get::<Profile>(post.author_id)?
        .map(|p| AuthorInfo::from(&p))
        .unwrap_or_else(|| AuthorInfo {
            id: post.author_id,
            ..Default::default()
        });
    let counters = db.counters(post.id)?;
    Ok(PostResponse::new(post, author, counters))
}

fn present_page(
    db: &Database,
    query: PostQuery,
    sort: Sort,
    page: PageRequest,
) -> Result<PostListResponse> {
    let (posts, total) = post::list(db, &query, sort, page)?;
    let posts = posts
        .into_iter()
        .map(|p| present(db, p))
        .collect::<Result<Vec<_>>>()?;
    Ok(PostListResponse {
        posts,
        total,
        page: page.page,
        limit: page.limit,
    })
}

/// Only the author and admins may change or delete a post.
fn ensure_owner(user: &User, post: &Post) -> Result<()> {
    if post.author_id == user.id || user.role().is_admin() {
        Ok(())
    } else {
        Err(Error::new_with(
            ErrorKind::Forbidden("not the author of this post".to_string()),
            None,
            Some(user.id),
        ))
    }
}

/// Published posts, newest first.
pub async fn list_posts(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Query(params): Query<ListParams>,
) -> Result<Json<PostListResponse>> {
    let query = PostQuery::published()
        .category(params.category)
        .tag(params.tag);
    let page = PageRequest::parse(
        params.page.as_deref(),
        params.limit.as_deref(),
        config.pagination.default_limit,
        config.pagination.max_limit,
    );
    let response = db
        .call(config.timeouts.standard(), move |db| {
            present_page(db, query, Sort::Published, page)
        })
        .await?;
    Ok(Json(response))
}

/// The caller's own posts, drafts included, most recently edited first.
pub async fn my_posts(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Query(params): Query<ListParams>,
) -> Result<Json<PostListResponse>> {
    let query = PostQuery::by_author(user.id);
    let page = PageRequest::parse(
        params.page.as_deref(),
        params.limit.as_deref(),
        config.pagination.default_limit,
        config.pagination.max_limit,
    );
    let response = db
        .call(config.timeouts.standard(), move |db| {
            present_page(db, query, Sort::Updated, page)
        })
        .await?;
    Ok(Json(response))
}

/// A single post by slug. Drafts are only found by their author.
pub async fn get_post(
    user: Option<User>,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>> {
    let viewer = user.map(|u| u.id);
    let response = db
        .call(config.timeouts.standard(), move |db| {
            let post = post::find_by_slug(db, &slug)?
                .filter(|p| p.visible_to(viewer))
                .ok_or_else(|| ErrorKind::not_found("post"))?;
            present(db, post)
        })
        .await?;
    Ok(Json(response))
}

pub async fn create_post(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Payload(new): Payload<NewPost>,
) -> Result<(StatusCode, Json<PostResponse>)> {
    user.require_author()?;

    let author = user.id;
    let response = db
        .call(config.timeouts.standard(), move |db| {
            let post = post::create(db, author, new)?;
            present(db, post)
        })
        .await?;

    metrics.incr(Counter::PostCreated);
    tracing::info!(
        post_id = %response.id,
        user_id = %author,
        slug = %response.slug,
        status = %response.status,
        "post_created"
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// Partial update, addressed by id or slug.
pub async fn update_post(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Path(key): Path<String>,
    Payload(update): Payload<PostUpdate>,
) -> Result<Json<PostResponse>> {
    let user_id = user.id;
    let response = db
        .call(config.timeouts.standard(), move |db| {
            let post = post::find_by_id_or_slug(db, &key)?
                .ok_or_else(|| ErrorKind::not_found("post"))?;
            ensure_owner(&user, &post)?;
            let post = post::update(db, post, update)?;
            present(db, post)
        })
        .await?;

    metrics.incr(Counter::PostUpdated);
    tracing::info!(post_id = %response.id, user_id = %user_id, "post_updated");
    Ok(Json(response))
}

/// Deletes the post together with its views, likes, comments and counters.
pub async fn delete_post(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>> {
    let user_id = user.id;
    let (post_id, report) = db
        .call(config.timeouts.standard(), move |db| {
            let post = post::find_by_id_or_slug(db, &key)?
                .ok_or_else(|| ErrorKind::not_found("post"))?;
            ensure_owner(&user, &post)?;
            post::remove(db, &post)?;
            let report = purge_post(db, post.id)?;
            Ok((post.id, report))
        })
        .await?;

    metrics.incr(Counter::PostDeleted);
    tracing::info!(
        post_id = %post_id,
        user_id = %user_id,
        views = report.views,
        likes = report.likes,
        comments = report.comments,
        "post_deleted"
    );
    Ok(Json(MessageResponse::new("Post deleted")))
}
