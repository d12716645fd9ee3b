//! Document store.
//!
//! Whole entities live pot-encoded under their uuid in a tree named after the
//! type (see [`Collectable`]). Engagement data lives in keyed trees whose key
//! layout doubles as the index: marker trees are keyed by
//! `post_id ‖ user_id`, which makes each pair unique, and comments are keyed
//! by `post_id ‖ created_at ‖ comment_id`, which keeps them sorted per post.

mod query;
mod sled;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Result;

pub use self::sled::SledDb as Database;
pub use query::{PageRequest, PostQuery, ProfileQuery};

/// Names of the keyed trees.
pub mod trees {
    pub const POST_VIEWS: &str = "post_views";
    pub const POST_LIKES: &str = "post_likes";
    pub const POST_COMMENTS: &str = "post_comments";
    pub const POST_COUNTERS: &str = "post_counters";
    pub const IMAGE_GROUPS: &str = "image_groups";

    pub const ALL: [&str; 5] = [
        POST_VIEWS,
        POST_LIKES,
        POST_COMMENTS,
        POST_COUNTERS,
        IMAGE_GROUPS,
    ];
}

pub trait Identifiable {
    fn get_id(&self) -> Uuid;
}

pub trait Collectable {
    fn get_collection_name() -> &'static str;
}

pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let t: T = pot::from_slice(bytes)?;
    Ok(t)
}

pub fn encode<T: serde::Serialize>(item: &T) -> Result<Vec<u8>> {
    let bytes = pot::to_vec(item)?;
    Ok(bytes)
}

/// Compound key of two ids, e.g. `post_id ‖ user_id`.
pub fn pair_key(first: Uuid, second: Uuid) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(first.as_bytes());
    key[16..].copy_from_slice(second.as_bytes());
    key
}

/// Key ordering entries under `prefix` by creation time, then id.
///
/// Timestamps are stored as big-endian microseconds so that byte order
/// equals chronological order.
pub fn timeline_key(prefix: Uuid, at: DateTime<Utc>, id: Uuid) -> [u8; 40] {
    let micros = at.timestamp_micros().max(0) as u64;
    let mut key = [0u8; 40];
    key[..16].copy_from_slice(prefix.as_bytes());
    key[16..24].copy_from_slice(&micros.to_be_bytes());
    key[24..].copy_from_slice(id.as_bytes());
    key
}

/// Key of a labelled member within a group, e.g. `group_id ‖ "thumb"`.
pub fn labelled_key(group: Uuid, label: &str) -> Vec<u8> {
    let mut key = group.as_bytes().to_vec();
    key.extend_from_slice(label.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn pair_keys_share_the_first_id_as_prefix() {
        let post = Uuid::new_v4();
        let key = pair_key(post, Uuid::new_v4());
        assert!(key.starts_with(post.as_bytes()));
    }

    #[test]
    fn timeline_keys_sort_chronologically() {
        let post = Uuid::new_v4();
        let now = Utc::now();
        let earlier = timeline_key(post, now - Duration::seconds(1), Uuid::from_u128(u128::MAX));
        let later = timeline_key(post, now, Uuid::nil());
        assert!(earlier < later);
    }
}
