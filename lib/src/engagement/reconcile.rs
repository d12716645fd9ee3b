use crate::error::Result;
use crate::PostId;

use super::{CommentStore, DedupStore, MarkerKind, PostCounterStore, PostCounters};

/// Recomputes the counters that have a source of truth: unique views from
/// view markers, likes from like markers and comments from the comments
/// themselves.
pub fn reconcile_counters<S>(store: &S, post: PostId) -> Result<PostCounters>
where
    S: PostCounterStore + DedupStore + CommentStore,
{
    let unique_views = store.count_markers(MarkerKind::View, post)? as u64;
    let likes = store.count_markers(MarkerKind::Like, post)? as u64;
    let comments = store.count_comments(post)? as u64;

    let counters = store.replace_derived(post, unique_views, likes, comments)?;
    tracing::info!(
        post_id = %post,
        view_count = counters.view_count,
        unique_view_count = counters.unique_view_count,
        like_count = counters.like_count,
        comment_count = counters.comment_count,
        "counters_reconciled"
    );
    Ok(counters)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub views: usize,
    pub likes: usize,
    pub comments: usize,
}

/// Drops every engagement record of a deleted post.
pub fn purge_post<S>(store: &S, post: PostId) -> Result<PurgeReport>
where
    S: PostCounterStore + DedupStore + CommentStore,
{
    let report = PurgeReport {
        views: store.remove_markers(MarkerKind::View, post)?,
        likes: store.remove_markers(MarkerKind::Like, post)?,
        comments: store.remove_comments(post)?,
    };
    store.remove_counters(post)?;
    tracing::debug!(post_id = %post, ?report, "engagement records purged");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::db::Database;
    use crate::engagement::{create_comment, record_view, toggle_like, CounterField};
    use crate::post::Status;
    use crate::{Comment, Post};

    use super::*;

    #[test]
    fn reconcile_repairs_drifted_counters() {
        let db = Database::temporary().unwrap();
        let post = Post {
            status: Status::Published,
            ..Default::default()
        };
        let reader = Uuid::new_v4();
        record_view(&db, &post, Some(reader)).unwrap();
        toggle_like(&db, &post, reader).unwrap();
        create_comment(&db, &post, reader, "hello", 2000).unwrap();

        // a comment whose increment never happened, and a stray decrement
        db.insert_comment(&Comment::new(post.id, reader, "orphan")).unwrap();
        db.adjust_counter(post.id, CounterField::Likes, -1).unwrap();

        let counters = reconcile_counters(&db, post.id).unwrap();
        assert_eq!(
            counters,
            PostCounters {
                view_count: 1,
                unique_view_count: 1,
                like_count: 1,
                comment_count: 2,
            }
        );
    }

    #[test]
    fn purge_leaves_nothing_behind() {
        let db = Database::temporary().unwrap();
        let post = Post {
            status: Status::Published,
            ..Default::default()
        };
        let other = Post {
            status: Status::Published,
            ..Default::default()
        };
        for _ in 0..2 {
            let user = Uuid::new_v4();
            record_view(&db, &post, Some(user)).unwrap();
            toggle_like(&db, &post, user).unwrap();
            create_comment(&db, &post, user, "hi", 2000).unwrap();
        }
        toggle_like(&db, &other, Uuid::new_v4()).unwrap();

        let report = purge_post(&db, post.id).unwrap();
        assert_eq!(
            report,
            PurgeReport {
                views: 2,
                likes: 2,
                comments: 2
            }
        );
        assert_eq!(db.counters(post.id).unwrap(), PostCounters::default());
        assert_eq!(db.count_markers(MarkerKind::Like, other.id).unwrap(), 1);
    }
}
