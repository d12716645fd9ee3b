use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::timeline_key;
use crate::{PostId, UserId};

pub type CommentId = Uuid;

/// Plain-text comment on a post. Stored per post in creation order, see
/// [`CommentStore`](crate::engagement::CommentStore).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    /// Author of the comment.
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: PostId, user_id: UserId, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> [u8; 40] {
        timeline_key(self.post_id, self.created_at, self.id)
    }
}
