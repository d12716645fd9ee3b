use chrono::Utc;

use crate::error::Result;
use crate::{Post, PostId, UserId};

use super::views::ensure_published;
use super::{CounterField, DedupStore, LikeMarker, LikeOutcome, MarkerKind, PostCounterStore};

/// Flips the user's like on the post.
///
/// Deleting an existing marker is an unlike. Otherwise a marker is inserted;
/// if a concurrent toggle got there first the insert reports the pair as
/// taken and the call settles on "already liked" without counting twice.
/// The returned count is read back from the store.
pub fn toggle_like<S>(store: &S, post: &Post, user: UserId) -> Result<LikeOutcome>
where
    S: PostCounterStore + DedupStore,
{
    ensure_published(post)?;

    let liked = if store.remove_marker(MarkerKind::Like, post.id, user)? {
        store.adjust_counter(post.id, CounterField::Likes, -1)?;
        tracing::info!(post_id = %post.id, user_id = %user, "post_unliked");
        false
    } else {
        let marker = LikeMarker {
            post_id: post.id,
            user_id: user,
            created_at: Utc::now(),
        };
        if store.insert_marker(&marker)? {
            store.adjust_counter(post.id, CounterField::Likes, 1)?;
            tracing::info!(post_id = %post.id, user_id = %user, "post_liked");
        } else {
            tracing::debug!(post_id = %post.id, user_id = %user, "like already present");
        }
        true
    };

    let like_count = store.counters(post.id)?.like_count;
    Ok(LikeOutcome { liked, like_count })
}

pub fn is_liked<S: DedupStore>(store: &S, post: PostId, user: UserId) -> Result<bool> {
    store.has_marker(MarkerKind::Like, post, user)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::db::Database;
    use crate::engagement::{Marker, PostCounters};
    use crate::post::Status;

    use super::*;

    fn published() -> Post {
        Post {
            status: Status::Published,
            ..Default::default()
        }
    }

    /// Store where another request always lands its like marker right
    /// before ours.
    struct LosesInsertRace<'a>(&'a Database);

    impl PostCounterStore for LosesInsertRace<'_> {
        fn counters(&self, post: PostId) -> Result<PostCounters> {
            self.0.counters(post)
        }

        fn adjust_counter(
            &self,
            post: PostId,
            field: CounterField,
            delta: i64,
        ) -> Result<PostCounters> {
            self.0.adjust_counter(post, field, delta)
        }

        fn replace_derived(
            &self,
            post: PostId,
            unique_views: u64,
            likes: u64,
            comments: u64,
        ) -> Result<PostCounters> {
            self.0.replace_derived(post, unique_views, likes, comments)
        }

        fn remove_counters(&self, post: PostId) -> Result<()> {
            self.0.remove_counters(post)
        }
    }

    impl DedupStore for LosesInsertRace<'_> {
        fn insert_marker<M: Marker>(&self, marker: &M) -> Result<bool> {
            self.0.insert_marker(marker)?;
            self.0.insert_marker(marker)
        }

        fn remove_marker(&self, kind: MarkerKind, post: PostId, user: UserId) -> Result<bool> {
            self.0.remove_marker(kind, post, user)
        }

        fn has_marker(&self, kind: MarkerKind, post: PostId, user: UserId) -> Result<bool> {
            self.0.has_marker(kind, post, user)
        }

        fn count_markers(&self, kind: MarkerKind, post: PostId) -> Result<usize> {
            self.0.count_markers(kind, post)
        }

        fn remove_markers(&self, kind: MarkerKind, post: PostId) -> Result<usize> {
            self.0.remove_markers(kind, post)
        }
    }

    #[test]
    fn toggling_cycles_between_two_states() {
        let db = Database::temporary().unwrap();
        let post = published();
        let user = Uuid::new_v4();

        let states = (0..4)
            .map(|_| toggle_like(&db, &post, user).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            states.iter().map(|s| s.liked).collect::<Vec<_>>(),
            vec![true, false, true, false]
        );
        assert_eq!(
            states.iter().map(|s| s.like_count).collect::<Vec<_>>(),
            vec![1, 0, 1, 0]
        );
        assert!(!is_liked(&db, post.id, user).unwrap());
    }

    #[test]
    fn like_count_reflects_other_users() {
        let db = Database::temporary().unwrap();
        let post = published();
        toggle_like(&db, &post, Uuid::new_v4()).unwrap();
        let outcome = toggle_like(&db, &post, Uuid::new_v4()).unwrap();
        assert_eq!(
            outcome,
            LikeOutcome {
                liked: true,
                like_count: 2
            }
        );
    }

    #[test]
    fn lost_insert_race_means_already_liked() {
        let db = Database::temporary().unwrap();
        let post = published();
        let user = Uuid::new_v4();

        let outcome = toggle_like(&LosesInsertRace(&db), &post, user).unwrap();
        assert!(outcome.liked);
        // the winning request owns the increment
        assert_eq!(outcome.like_count, 0);
        assert!(is_liked(&db, post.id, user).unwrap());
    }
}
