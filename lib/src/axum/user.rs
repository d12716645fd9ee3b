use std::str::FromStr;

use axum::extract::{Path, Query};
use axum::routing::{get, put};
use axum::{Extension, Json};

use crate::api::{ListParams, RoleUpdate, UserListItem, UserListResponse};
use crate::axum::extract::{Payload, User};
use crate::axum::{ConfigExt, DbExt, Router};
use crate::db::{PageRequest, ProfileQuery};
use crate::user::User as RawUser;
use crate::util::parse_id;
use crate::{routes, ErrorKind, Profile, Result, Role};

pub fn router() -> Router {
    Router::new()
        .route(routes::USERS, get(list_users))
        .route(routes::USER_ROLE, put(update_role))
}

fn parse_role(raw: &str) -> Result<Role> {
    Role::from_str(raw.trim()).map_err(|_| {
        ErrorKind::BadInput("role must be one of 'admin', 'author', 'user'".to_string()).into()
    })
}

/// Admin listing of accounts, newest first, filterable by role and name.
pub async fn list_users(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Query(params): Query<ListParams>,
) -> Result<Json<UserListResponse>> {
    user.require_admin()?;

    let query = ProfileQuery {
        role: params
            .role
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(parse_role)
            .transpose()?,
        search: params.search.filter(|s| !s.trim().is_empty()),
    };
    let page = PageRequest::parse(
        params.page.as_deref(),
        params.limit.as_deref(),
        config.pagination.users_default_limit,
        config.pagination.users_max_limit,
    );

    let (users, total) = db
        .call(config.timeouts.standard(), move |db| {
            let mut profiles = db
                .get_collection::<Profile>()?
                .into_iter()
                .filter(|p| query.matches(p))
                .collect::<Vec<_>>();
            profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let total = profiles.len();

            let mut items = Vec::new();
            for profile in page.slice(profiles) {
                let email = db
                    .try_get::<RawUser>(profile.user_id)?
                    .map(|u| u.email)
                    .unwrap_or_default();
                items.push(UserListItem {
                    id: profile.user_id,
                    email,
                    name: profile.name,
                    avatar: profile.avatar,
                    role: profile.role,
                    created_at: profile.created_at,
                });
            }
            Ok((items, total))
        })
        .await?;

    Ok(Json(UserListResponse {
        users,
        total,
        page: page.page,
        limit: page.limit,
    }))
}

/// Changes the role of an account.
pub async fn update_role(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Path(id): Path<String>,
    Payload(update): Payload<RoleUpdate>,
) -> Result<Json<Profile>> {
    user.require_admin()?;
    let target = parse_id(&id)?;
    let role = parse_role(&update.role)?;

    let profile = db
        .call(config.timeouts.standard(), move |db| {
            let mut profile = db
                .try_get::<Profile>(target)?
                .ok_or_else(|| ErrorKind::UserNotFound(target.to_string()))?;
            profile.role = role;
            profile.updated_at = chrono::Utc::now();
            db.set(&profile)?;
            Ok(profile)
        })
        .await?;

    tracing::info!(
        user_id = %target,
        role = %role,
        admin_id = %user.id,
        "user_role_updated"
    );
    Ok(Json(profile))
}
