use chrono::Utc;

use crate::error::{ErrorKind, Result};
use crate::{Post, UserId};

use super::{
    CounterField, DedupStore, MarkerKind, PostCounterStore, PostStats, ViewMarker, ViewOutcome,
};

pub(super) fn ensure_published(post: &Post) -> Result<()> {
    if post.is_published() {
        Ok(())
    } else {
        Err(ErrorKind::not_found("post").into())
    }
}

/// Counts a view of the post.
///
/// The raw `view_count` goes up on every call. For an identified viewer a
/// view marker is inserted as well, and only the call that actually creates
/// it bumps `unique_view_count`, no matter how many requests race.
pub fn record_view<S>(store: &S, post: &Post, viewer: Option<UserId>) -> Result<ViewOutcome>
where
    S: PostCounterStore + DedupStore,
{
    ensure_published(post)?;
    store.adjust_counter(post.id, CounterField::Views, 1)?;

    let mut unique = false;
    if let Some(user_id) = viewer {
        let marker = ViewMarker {
            post_id: post.id,
            user_id,
            viewed_at: Utc::now(),
        };
        if store.insert_marker(&marker)? {
            store.adjust_counter(post.id, CounterField::UniqueViews, 1)?;
            unique = true;
        }
    }

    tracing::info!(post_id = %post.id, user_id = ?viewer, unique, "post_view_recorded");
    Ok(ViewOutcome { unique })
}

/// Current counters of the post, plus whether the viewer likes it.
pub fn post_stats<S>(store: &S, post: &Post, viewer: Option<UserId>) -> Result<PostStats>
where
    S: PostCounterStore + DedupStore,
{
    ensure_published(post)?;
    let counters = store.counters(post.id)?;
    let liked = match viewer {
        Some(user_id) => store.has_marker(MarkerKind::Like, post.id, user_id)?,
        None => false,
    };
    Ok(PostStats { counters, liked })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use crate::db::Database;
    use crate::engagement::toggle_like;
    use crate::post::Status;

    use super::*;

    fn published() -> Post {
        Post {
            status: Status::Published,
            ..Default::default()
        }
    }

    #[test]
    fn anonymous_views_only_touch_the_raw_counter() {
        let db = Database::temporary().unwrap();
        let post = published();
        for _ in 0..3 {
            let outcome = record_view(&db, &post, None).unwrap();
            assert!(!outcome.unique);
        }
        let counters = db.counters(post.id).unwrap();
        assert_eq!(counters.view_count, 3);
        assert_eq!(counters.unique_view_count, 0);
    }

    #[test]
    fn repeat_views_count_once_as_unique() {
        let db = Database::temporary().unwrap();
        let post = published();
        let user = Uuid::new_v4();
        assert!(record_view(&db, &post, Some(user)).unwrap().unique);
        assert!(!record_view(&db, &post, Some(user)).unwrap().unique);
        assert!(record_view(&db, &post, Some(Uuid::new_v4())).unwrap().unique);

        let counters = db.counters(post.id).unwrap();
        assert_eq!(counters.view_count, 3);
        assert_eq!(counters.unique_view_count, 2);
    }

    #[test]
    fn concurrent_views_from_one_user_are_unique_once() {
        const N: usize = 24;
        let db = Arc::new(Database::temporary().unwrap());
        let post = Arc::new(published());
        let user = Uuid::new_v4();

        let handles = (0..N)
            .map(|_| {
                let db = db.clone();
                let post = post.clone();
                std::thread::spawn(move || record_view(&*db, &post, Some(user)).unwrap())
            })
            .collect::<Vec<_>>();
        let unique = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| outcome.unique)
            .count();

        assert_eq!(unique, 1);
        let counters = db.counters(post.id).unwrap();
        assert_eq!(counters.view_count, N as u64);
        assert_eq!(counters.unique_view_count, 1);
    }

    #[test]
    fn drafts_cannot_be_viewed() {
        let db = Database::temporary().unwrap();
        let draft = Post::default();
        let err = record_view(&db, &draft, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
        assert_eq!(db.counters(draft.id).unwrap().view_count, 0);
    }

    #[test]
    fn anonymous_stats_never_report_liked() {
        let db = Database::temporary().unwrap();
        let post = published();
        for _ in 0..5 {
            toggle_like(&db, &post, Uuid::new_v4()).unwrap();
        }

        let stats = post_stats(&db, &post, None).unwrap();
        assert_eq!(stats.counters.like_count, 5);
        assert!(!stats.liked);

        let liker = Uuid::new_v4();
        toggle_like(&db, &post, liker).unwrap();
        assert!(post_stats(&db, &post, Some(liker)).unwrap().liked);
        assert!(!post_stats(&db, &post, None).unwrap().liked);
    }
}
