use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use http::StatusCode;

use crate::error::{Error, ErrorKind, Result};

/// File part of a multipart upload.
#[derive(Clone, Debug)]
pub struct FilePart {
    /// Content type declared by the client for the part, if any.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Reads the first part named `field` out of the multipart body.
///
/// Bodies cut off by the request size limit fail with `PayloadTooLarge`,
/// anything else malformed with `BadInput`.
pub async fn file_field(
    multipart: std::result::Result<Multipart, MultipartRejection>,
    field: &str,
    max_bytes: usize,
) -> Result<FilePart> {
    let mut multipart =
        multipart.map_err(|rejection| ErrorKind::BadInput(rejection.body_text()))?;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let content_type = part.content_type().map(str::to_string);
        let bytes = part.bytes().await.map_err(|e| multipart_error(e, max_bytes))?;
        return Ok(FilePart {
            content_type,
            bytes,
        });
    }

    Err(ErrorKind::BadInput(format!("missing file field '{field}'")).into())
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ErrorKind::PayloadTooLarge(max_bytes).into()
    } else {
        ErrorKind::BadInput(e.body_text()).into()
    }
}
