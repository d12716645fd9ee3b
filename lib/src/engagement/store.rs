use crate::db::{pair_key, trees, Database, PageRequest};
use crate::{Comment, CommentId, PostId, Result, UserId};

use super::{
    CommentStore, CounterField, DedupStore, Marker, MarkerKind, PostCounterStore, PostCounters,
};

impl PostCounterStore for Database {
    fn counters(&self, post: PostId) -> Result<PostCounters> {
        Ok(self
            .get_key(trees::POST_COUNTERS, post.as_bytes())?
            .unwrap_or_default())
    }

    fn adjust_counter(
        &self,
        post: PostId,
        field: CounterField,
        delta: i64,
    ) -> Result<PostCounters> {
        self.update_key(trees::POST_COUNTERS, post.as_bytes(), |c: &mut PostCounters| {
            c.apply(field, delta)
        })
    }

    fn replace_derived(
        &self,
        post: PostId,
        unique_views: u64,
        likes: u64,
        comments: u64,
    ) -> Result<PostCounters> {
        self.update_key(trees::POST_COUNTERS, post.as_bytes(), |c: &mut PostCounters| {
            c.unique_view_count = unique_views;
            c.like_count = likes;
            c.comment_count = comments;
            c.view_count = c.view_count.max(unique_views);
        })
    }

    fn remove_counters(&self, post: PostId) -> Result<()> {
        self.remove_key(trees::POST_COUNTERS, post.as_bytes())?;
        Ok(())
    }
}

impl DedupStore for Database {
    fn insert_marker<M: Marker>(&self, marker: &M) -> Result<bool> {
        let key = pair_key(marker.post_id(), marker.user_id());
        self.insert_if_absent(M::KIND.tree(), &key, marker)
    }

    fn remove_marker(&self, kind: MarkerKind, post: PostId, user: UserId) -> Result<bool> {
        self.remove_key(kind.tree(), &pair_key(post, user))
    }

    fn has_marker(&self, kind: MarkerKind, post: PostId, user: UserId) -> Result<bool> {
        self.contains_key(kind.tree(), &pair_key(post, user))
    }

    fn count_markers(&self, kind: MarkerKind, post: PostId) -> Result<usize> {
        self.count_prefix(kind.tree(), post.as_bytes())
    }

    fn remove_markers(&self, kind: MarkerKind, post: PostId) -> Result<usize> {
        self.remove_prefix(kind.tree(), post.as_bytes())
    }
}

impl CommentStore for Database {
    fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.put_key(trees::POST_COMMENTS, &comment.key(), comment)
    }

    fn find_comment(&self, post: PostId, id: CommentId) -> Result<Option<Comment>> {
        Ok(self
            .find_in_prefix(trees::POST_COMMENTS, post.as_bytes(), |c: &Comment| c.id == id)?
            .map(|(_, comment)| comment))
    }

    fn remove_comment(&self, comment: &Comment) -> Result<bool> {
        self.remove_key(trees::POST_COMMENTS, &comment.key())
    }

    fn count_comments(&self, post: PostId) -> Result<usize> {
        self.count_prefix(trees::POST_COMMENTS, post.as_bytes())
    }

    fn list_comments(&self, post: PostId, page: PageRequest) -> Result<Vec<Comment>> {
        self.scan_prefix(
            trees::POST_COMMENTS,
            post.as_bytes(),
            true,
            page.skip(),
            page.limit,
        )
    }

    fn remove_comments(&self, post: PostId) -> Result<usize> {
        self.remove_prefix(trees::POST_COMMENTS, post.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::super::{LikeMarker, ViewMarker};
    use super::*;

    #[test]
    fn markers_are_unique_per_pair() {
        let db = Database::temporary().unwrap();
        let (post, user) = (Uuid::new_v4(), Uuid::new_v4());
        let marker = ViewMarker {
            post_id: post,
            user_id: user,
            viewed_at: Utc::now(),
        };
        assert!(db.insert_marker(&marker).unwrap());
        assert!(!db.insert_marker(&marker).unwrap());
        assert!(db.has_marker(MarkerKind::View, post, user).unwrap());
        // separate trees per kind
        assert!(!db.has_marker(MarkerKind::Like, post, user).unwrap());

        let like = LikeMarker {
            post_id: post,
            user_id: user,
            created_at: Utc::now(),
        };
        assert!(db.insert_marker(&like).unwrap());
        assert_eq!(db.count_markers(MarkerKind::Like, post).unwrap(), 1);
        assert!(db.remove_marker(MarkerKind::Like, post, user).unwrap());
        assert!(!db.remove_marker(MarkerKind::Like, post, user).unwrap());
    }

    #[test]
    fn derived_replacement_keeps_views_above_unique() {
        let db = Database::temporary().unwrap();
        let post = Uuid::new_v4();
        db.adjust_counter(post, CounterField::Views, 2).unwrap();
        let counters = db.replace_derived(post, 5, 1, 0).unwrap();
        assert_eq!(counters.view_count, 5);
        assert_eq!(counters.unique_view_count, 5);

        db.adjust_counter(post, CounterField::Views, 10).unwrap();
        let counters = db.replace_derived(post, 5, 1, 0).unwrap();
        assert_eq!(counters.view_count, 15);
    }

    #[test]
    fn comments_list_newest_first() {
        let db = Database::temporary().unwrap();
        let post = Uuid::new_v4();
        let mut ids = Vec::new();
        for i in 0..3 {
            let comment = Comment::new(post, Uuid::new_v4(), format!("comment {i}"));
            ids.push(comment.id);
            db.insert_comment(&comment).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        db.insert_comment(&Comment::new(Uuid::new_v4(), Uuid::new_v4(), "elsewhere"))
            .unwrap();

        let page = PageRequest { page: 1, limit: 2 };
        let listed = db.list_comments(post, page).unwrap();
        assert_eq!(
            listed.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![ids[2], ids[1]]
        );
        assert_eq!(db.count_comments(post).unwrap(), 3);

        let found = db.find_comment(post, ids[0]).unwrap().unwrap();
        assert!(db.remove_comment(&found).unwrap());
        assert!(db.find_comment(post, ids[0]).unwrap().is_none());
    }
}
