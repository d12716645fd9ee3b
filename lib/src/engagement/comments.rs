use crate::db::PageRequest;
use crate::error::{ErrorKind, Result};
use crate::{Comment, CommentId, Post, UserId};

use super::views::ensure_published;
use super::{Actor, CommentStore, CounterField, PostCounterStore};

/// Stores a new comment on a published post and counts it.
///
/// Content is trimmed and must hold between 1 and `max_len` characters.
pub fn create_comment<S>(
    store: &S,
    post: &Post,
    user: UserId,
    content: &str,
    max_len: usize,
) -> Result<Comment>
where
    S: PostCounterStore + CommentStore,
{
    let content = content.trim();
    let length = content.chars().count();
    if length == 0 || length > max_len {
        return Err(ErrorKind::BadInput(format!(
            "comment must be between 1 and {max_len} characters"
        ))
        .into());
    }
    ensure_published(post)?;

    let comment = Comment::new(post.id, user, content);
    store.insert_comment(&comment)?;
    store.adjust_counter(post.id, CounterField::Comments, 1)?;

    tracing::info!(
        post_id = %post.id,
        comment_id = %comment.id,
        user_id = %user,
        "comment_created"
    );
    Ok(comment)
}

/// Removes a comment. Allowed for the comment's author, the post's author
/// and admins.
pub fn delete_comment<S>(store: &S, post: &Post, id: CommentId, actor: Actor) -> Result<()>
where
    S: PostCounterStore + CommentStore,
{
    let comment = store
        .find_comment(post.id, id)?
        .ok_or_else(|| ErrorKind::not_found("comment"))?;

    let permitted = comment.user_id == actor.user_id
        || post.author_id == actor.user_id
        || actor.role.is_admin();
    if !permitted {
        return Err(ErrorKind::Forbidden("not allowed to delete this comment".to_string()).into());
    }

    if store.remove_comment(&comment)? {
        store.adjust_counter(post.id, CounterField::Comments, -1)?;
    }

    tracing::info!(
        post_id = %post.id,
        comment_id = %id,
        user_id = %actor.user_id,
        "comment_deleted"
    );
    Ok(())
}

/// A page of the post's comments, newest first, with the total count.
pub fn list_comments<S: CommentStore>(
    store: &S,
    post: &Post,
    page: PageRequest,
) -> Result<(Vec<Comment>, usize)> {
    let comments = store.list_comments(post.id, page)?;
    let total = store.count_comments(post.id)?;
    Ok((comments, total))
}
