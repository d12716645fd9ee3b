//! Stored images.
//!
//! Post images are kept inline as base64 JPEG documents and served back as
//! opaque bytes. Multi-resolution uploads share a `group_id` and are told
//! apart by `size_label`; the `image_groups` tree maps each
//! `group_id ‖ size_label` pair onto the image stored last under it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{labelled_key, trees, Collectable, Database, Identifiable};
use crate::error::Result;
use crate::imaging::ProcessedImage;
use crate::routes;
use crate::UserId;

pub type ImageId = Uuid;
pub type GroupId = Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: ImageId,
    pub uploader_id: UserId,
    pub group_id: Option<GroupId>,
    pub size_label: Option<String>,
    pub width: Option<u32>,
    /// Base64 of the JPEG bytes.
    pub data: String,
    /// Length of the decoded JPEG in bytes.
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

impl Collectable for StoredImage {
    fn get_collection_name() -> &'static str {
        "image"
    }
}

impl Identifiable for StoredImage {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl StoredImage {
    pub fn new(uploader_id: UserId, image: &ProcessedImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            uploader_id,
            group_id: None,
            size_label: None,
            width: None,
            data: image.to_base64(),
            size: image.bytes.len(),
            created_at: Utc::now(),
        }
    }

    /// Marks the image as the `label` variant of `group`.
    pub fn in_group(mut self, group: GroupId, label: impl Into<String>, width: u32) -> Self {
        self.group_id = Some(group);
        self.size_label = Some(label.into());
        self.width = Some(width);
        self
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(&self.data)?)
    }

    pub fn url(&self) -> String {
        url_for(self.id)
    }
}

pub fn url_for(id: ImageId) -> String {
    format!("{}{}/{}", routes::API, routes::BLOG_IMAGES, id)
}

/// Persists the image and, for grouped variants, points the group index at
/// it.
pub fn store(db: &Database, image: &StoredImage) -> Result<()> {
    db.set(image)?;
    if let (Some(group), Some(label)) = (image.group_id, &image.size_label) {
        db.put_key(trees::IMAGE_GROUPS, &labelled_key(group, label), &image.id)?;
    }
    Ok(())
}

pub fn find_in_group(db: &Database, group: GroupId, label: &str) -> Result<Option<StoredImage>> {
    match db.get_key::<ImageId>(trees::IMAGE_GROUPS, &labelled_key(group, label))? {
        Some(id) => db.try_get(id),
        None => Ok(None),
    }
}
