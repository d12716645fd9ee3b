//! Engagement counters: views, likes and comments.
//!
//! Each post carries four denormalized counters ([`PostCounters`]). They are
//! only ever moved by atomic adjustments, never written wholesale by request
//! handling. Where uniqueness matters a marker record is inserted first and
//! the counter follows only if the insert actually created it:
//!
//! | action | marker | counter |
//! |---|---|---|
//! | view | [`ViewMarker`], insert-if-absent, authenticated only | `view_count` always, `unique_view_count` on first insert |
//! | like | [`LikeMarker`], delete-if-exists, else insert-if-absent | `like_count` ±1 |
//! | comment | [`Comment`](crate::Comment) insert / remove | `comment_count` ±1 |
//!
//! The marker trees are keyed by `post_id ‖ user_id`, so the store's atomic
//! insert-if-absent is the only concurrency control involved. Marker writes
//! and counter adjustments are separate operations; a crash in between
//! leaves a counter off by one until [`reconcile_counters`] runs.

mod comments;
mod likes;
mod reconcile;
mod store;
mod views;

use chrono::{DateTime, Utc};

use crate::db::{trees, PageRequest};
use crate::{Comment, CommentId, PostId, Result, Role, UserId};

pub use comments::{create_comment, delete_comment, list_comments};
pub use likes::{is_liked, toggle_like};
pub use reconcile::{purge_post, reconcile_counters, PurgeReport};
pub use views::{post_stats, record_view};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostCounters {
    pub view_count: u64,
    pub unique_view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterField {
    Views,
    UniqueViews,
    Likes,
    Comments,
}

impl PostCounters {
    /// Adjusts a single counter. Decrements stop at zero.
    pub fn apply(&mut self, field: CounterField, delta: i64) {
        let counter = match field {
            CounterField::Views => &mut self.view_count,
            CounterField::UniqueViews => &mut self.unique_view_count,
            CounterField::Likes => &mut self.like_count,
            CounterField::Comments => &mut self.comment_count,
        };
        if delta >= 0 {
            *counter = counter.saturating_add(delta as u64);
        } else {
            *counter = counter.saturating_sub(delta.unsigned_abs());
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    View,
    Like,
}

impl MarkerKind {
    pub fn tree(&self) -> &'static str {
        match self {
            MarkerKind::View => trees::POST_VIEWS,
            MarkerKind::Like => trees::POST_LIKES,
        }
    }
}

/// Sentinel record whose existence alone encodes a fact about a
/// (post, user) pair.
pub trait Marker: serde::Serialize {
    const KIND: MarkerKind;

    fn post_id(&self) -> PostId;
    fn user_id(&self) -> UserId;
}

/// "This user has viewed this post". Written at most once, never removed
/// while the post exists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewMarker {
    pub post_id: PostId,
    pub user_id: UserId,
    pub viewed_at: DateTime<Utc>,
}

impl Marker for ViewMarker {
    const KIND: MarkerKind = MarkerKind::View;

    fn post_id(&self) -> PostId {
        self.post_id
    }

    fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// "This user likes this post". Removed on unlike.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LikeMarker {
    pub post_id: PostId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Marker for LikeMarker {
    const KIND: MarkerKind = MarkerKind::Like;

    fn post_id(&self) -> PostId {
        self.post_id
    }

    fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Counter document per post.
pub trait PostCounterStore {
    /// Current counters, all zero for a post never engaged with.
    fn counters(&self, post: PostId) -> Result<PostCounters>;

    /// Atomically adjusts one counter and returns the counters as stored
    /// right after the adjustment.
    fn adjust_counter(&self, post: PostId, field: CounterField, delta: i64)
        -> Result<PostCounters>;

    /// Atomically replaces the counters derivable from source records.
    /// `view_count` has no source of truth and is only raised as far as
    /// needed to stay at or above `unique_view_count`.
    fn replace_derived(
        &self,
        post: PostId,
        unique_views: u64,
        likes: u64,
        comments: u64,
    ) -> Result<PostCounters>;

    fn remove_counters(&self, post: PostId) -> Result<()>;
}

/// Marker collections with a unique `(post, user)` key.
pub trait DedupStore {
    /// Inserts the marker unless one already exists for the pair. Returns
    /// `true` if this call created it.
    fn insert_marker<M: Marker>(&self, marker: &M) -> Result<bool>;

    /// Deletes the marker if present. Returns `true` if this call deleted it.
    fn remove_marker(&self, kind: MarkerKind, post: PostId, user: UserId) -> Result<bool>;

    fn has_marker(&self, kind: MarkerKind, post: PostId, user: UserId) -> Result<bool>;

    fn count_markers(&self, kind: MarkerKind, post: PostId) -> Result<usize>;

    fn remove_markers(&self, kind: MarkerKind, post: PostId) -> Result<usize>;
}

/// Comments kept per post, newest last in key order.
pub trait CommentStore {
    fn insert_comment(&self, comment: &Comment) -> Result<()>;

    fn find_comment(&self, post: PostId, id: CommentId) -> Result<Option<Comment>>;

    /// Returns `true` if this call removed the comment.
    fn remove_comment(&self, comment: &Comment) -> Result<bool>;

    fn count_comments(&self, post: PostId) -> Result<usize>;

    /// One page of comments, newest first.
    fn list_comments(&self, post: PostId, page: PageRequest) -> Result<Vec<Comment>>;

    fn remove_comments(&self, post: PostId) -> Result<usize>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewOutcome {
    /// Whether this view was the viewer's first one on the post.
    pub unique: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStats {
    #[serde(flatten)]
    pub counters: PostCounters,
    /// Only ever true for an identified viewer who likes the post.
    pub liked: bool,
}

/// Identity attempting a privileged action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}
