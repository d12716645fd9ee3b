use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::routing::{get, post};
use axum::{Extension, Json};

use crate::axum::extract::upload::file_field;
use crate::axum::extract::{Payload, User};
use crate::axum::{ConfigExt, DbExt, MetricsExt, Router};
use crate::imaging::{process, UploadPolicy};
use crate::metrics::Counter;
use crate::profile::{set_avatar, update as apply_update, ProfileUpdate};
use crate::{routes, Profile, Result};

pub fn router() -> Router {
    Router::new()
        .route(routes::PROFILE, get(profile).put(update_profile))
        .route(routes::PROFILE_AVATAR, post(upload_avatar))
}

pub async fn profile(user: User) -> Json<Profile> {
    Json(user.profile)
}

/// Partially updates name, bio and settings.
pub async fn update_profile(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Payload(update): Payload<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let user_id = user.id;
    let (profile, changed) = db
        .call(config.timeouts.standard(), move |db| apply_update(db, user_id, update))
        .await?;

    metrics.incr(Counter::ProfileUpdated);
    tracing::info!(user_id = %profile.user_id, changed, "profile_updated");
    Ok(Json(profile))
}

/// Replaces the avatar with a square JPEG thumbnail of the upload, stored as
/// a data URI on the profile.
pub async fn upload_avatar(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Profile>> {
    let policy = UploadPolicy::avatar(&config.uploads);
    let file = file_field(multipart, "avatar", policy.max_bytes).await?;
    policy.check_declared(file.content_type.as_deref())?;

    let processed = tokio::task::spawn_blocking(move || process(&policy, &file.bytes)).await??;

    let user_id = user.id;
    let avatar = processed.to_data_uri();
    let profile = db
        .call(config.timeouts.standard(), move |db| set_avatar(db, user_id, &avatar))
        .await?;

    metrics.incr(Counter::AvatarUpload);
    tracing::info!(
        user_id = %profile.user_id,
        width = processed.width,
        height = processed.height,
        size = processed.bytes.len(),
        "avatar_uploaded"
    );
    Ok(Json(profile))
}
