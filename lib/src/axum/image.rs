use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::Path;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::api::{CoverUploadResponse, UploadResponse, VariantResponse};
use crate::axum::extract::upload::file_field;
use crate::axum::extract::User;
use crate::axum::{ConfigExt, DbExt, MetricsExt, Router};
use crate::imaging::{process, UploadPolicy, JPEG_MIME};
use crate::media::{self, StoredImage};
use crate::metrics::Counter;
use crate::util::parse_id;
use crate::{routes, ErrorKind, Result};

const CACHE_CONTROL: &str = "public, max-age=604800, immutable";

pub fn router() -> Router {
    Router::new()
        .route(routes::BLOG_UPLOAD, post(upload_image))
        .route(routes::BLOG_UPLOAD_COVER, post(upload_cover))
        .route(routes::BLOG_IMAGE, get(image))
        .route(routes::BLOG_IMAGE_VARIANT, get(image_variant))
}

/// Stores an inline post image, scaled down to the configured width.
pub async fn upload_image(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let policy = UploadPolicy::post_image(&config.uploads);
    let file = file_field(multipart, "image", policy.max_bytes).await?;

    let processed = tokio::task::spawn_blocking(move || process(&policy, &file.bytes)).await??;
    let stored = StoredImage::new(user.id, &processed);

    let record = stored.clone();
    db.call(config.timeouts.standard(), move |db| media::store(db, &record))
        .await?;

    metrics.incr(Counter::PostImageUpload);
    tracing::info!(
        image_id = %stored.id,
        user_id = %user.id,
        width = processed.width,
        height = processed.height,
        size = stored.size,
        "blog_image_uploaded"
    );
    Ok(Json(UploadResponse { url: stored.url() }))
}

/// Stores one variant of a cover image per configured size label, all under
/// a fresh group id.
pub async fn upload_cover(
    user: User,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<CoverUploadResponse>> {
    let max_bytes = config.uploads.max_bytes;
    let file = file_field(multipart, "image", max_bytes).await?;

    let uploads = config.uploads.clone();
    let uploader = user.id;
    let group = Uuid::new_v4();
    let variants = tokio::task::spawn_blocking(move || {
        uploads
            .variants
            .iter()
            .map(|variant| -> Result<StoredImage> {
                let policy = UploadPolicy::variant(&uploads, variant.width);
                let processed = process(&policy, &file.bytes)?;
                let width = processed.width;
                Ok(StoredImage::new(uploader, &processed).in_group(
                    group,
                    variant.label.as_str(),
                    width,
                ))
            })
            .collect::<Result<Vec<_>>>()
    })
    .await??;

    let records = variants.clone();
    db.call(config.timeouts.standard(), move |db| {
        records.iter().try_for_each(|image| media::store(db, image))
    })
    .await?;

    let images = variants
        .iter()
        .map(|image| VariantResponse {
            size_label: image.size_label.clone().unwrap_or_default(),
            width: image.width.unwrap_or_default(),
            url: image.url(),
        })
        .collect::<Vec<_>>();

    metrics.incr(Counter::CoverImageUpload);
    tracing::info!(
        group_id = %group,
        user_id = %uploader,
        variants = images.len(),
        "cover_image_uploaded"
    );
    Ok(Json(CoverUploadResponse {
        group_id: group,
        images,
    }))
}

fn serve_image(image: StoredImage) -> Result<impl IntoResponse> {
    let bytes = image.bytes()?;
    Ok((
        [
            (header::CONTENT_TYPE, JPEG_MIME.to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
        ],
        bytes,
    ))
}

/// Raw JPEG bytes of a stored image.
pub async fn image(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let image = db
        .call(config.timeouts.quick(), move |db| {
            db.try_get::<StoredImage>(id)?
                .ok_or_else(|| ErrorKind::not_found("image").into())
        })
        .await?;
    serve_image(image)
}

/// Raw JPEG bytes of one size variant of a cover image.
pub async fn image_variant(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Path((group, label)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let group = parse_id(&group)?;
    let image = db
        .call(config.timeouts.quick(), move |db| {
            media::find_in_group(db, group, &label)?
                .ok_or_else(|| ErrorKind::not_found("image").into())
        })
        .await?;
    serve_image(image)
}
