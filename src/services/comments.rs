//! Two-level comment threads.

use std::collections::HashMap;

use tracing::info;

use super::{ServiceContext, visible_prompt};
use super::prompts::validate_text;
use crate::storage::{CommentStore, PromptStore};
use crate::types::{
    Comment, CommentNode, CommentStatus, CommentThread, HubError, PointReason, Result,
    StatField, ToggleOutcome, User, ValidationError, ValidationErrorKind, new_id, to_timestamp,
};

pub struct CommentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CommentService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Post a comment or a reply.
    ///
    /// Replies to a reply are attached to its root so threads stay one level deep.
    pub fn add(
        &self,
        user: &User,
        prompt_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Comment> {
        let content = validate_text(
            "comment",
            content,
            self.ctx.config.content.max_comment_length,
        )?;

        let comment = self.ctx.db.transaction(|conn| {
            let prompt = visible_prompt(conn, Some(user), prompt_id)?;

            let comments = CommentStore::new(conn);
            let root_id = match parent_id {
                Some(parent_id) => {
                    let parent = comments
                        .get(parent_id)?
                        .filter(Comment::is_active)
                        .ok_or_else(|| HubError::not_found("comment", parent_id))?;
                    if parent.prompt_id != prompt.id {
                        return Err(ValidationError::new(
                            ValidationErrorKind::Consistency,
                            "parent comment belongs to another prompt",
                        )
                        .with_field("parent")
                        .into());
                    }
                    Some(parent.parent_id.unwrap_or(parent.id))
                }
                None => None,
            };

            let now = self.ctx.now();
            let comment = Comment {
                id: new_id(),
                prompt_id: prompt.id.clone(),
                author_id: user.id.clone(),
                author_name: user.username.clone(),
                content,
                parent_id: root_id,
                likes: 0,
                status: CommentStatus::Active,
                created_at: now,
                updated_at: now,
            };
            comments.insert(&comment)?;
            PromptStore::new(conn).set_stat(&prompt.id, StatField::Comments, comments.count_active(&prompt.id)?)?;

            self.ctx.points().grant_in(
                conn,
                &user.id,
                PointReason::CommentCreated,
                &comment.id,
                self.ctx.config.points.comment_created,
            )?;
            Ok(comment)
        })?;

        info!(comment_id = %comment.id, prompt_id = %comment.prompt_id, reply = comment.is_reply(), "Comment added");
        Ok(comment)
    }

    /// Soft delete; only the author may delete
    pub fn delete(&self, user: &User, comment_id: &str) -> Result<()> {
        self.ctx.db.transaction(|conn| {
            let comments = CommentStore::new(conn);
            let comment = comments
                .get(comment_id)?
                .filter(Comment::is_active)
                .ok_or_else(|| HubError::not_found("comment", comment_id))?;
            if comment.author_id != user.id {
                return Err(HubError::forbidden("only the author can delete this comment"));
            }

            comments.soft_delete(&comment.id, to_timestamp(self.ctx.now()))?;
            PromptStore::new(conn).set_stat(
                &comment.prompt_id,
                StatField::Comments,
                comments.count_active(&comment.prompt_id)?,
            )?;
            Ok(())
        })?;

        info!(comment_id, "Comment deleted");
        Ok(())
    }

    pub fn toggle_like(&self, user: &User, comment_id: &str) -> Result<ToggleOutcome> {
        self.ctx.db.transaction(|conn| {
            let comments = CommentStore::new(conn);
            let comment = comments
                .get(comment_id)?
                .filter(Comment::is_active)
                .ok_or_else(|| HubError::not_found("comment", comment_id))?;
            let (active, count) =
                comments.toggle_like(&comment.id, &user.id, to_timestamp(self.ctx.now()))?;
            Ok(ToggleOutcome { active, count })
        })
    }

    pub fn get(&self, id: &str) -> Result<Comment> {
        let conn = self.ctx.db.connection()?;
        CommentStore::new(&conn)
            .get(id)?
            .ok_or_else(|| HubError::not_found("comment", id))
    }

    /// Active comments of a prompt, newest first
    pub fn list(&self, viewer: Option<&User>, prompt_id: &str) -> Result<Vec<Comment>> {
        let conn = self.ctx.db.connection()?;
        let prompt = visible_prompt(&conn, viewer, prompt_id)?;
        let mut comments: Vec<Comment> = CommentStore::new(&conn)
            .for_prompt(&prompt.id)?
            .into_iter()
            .filter(Comment::is_active)
            .collect();
        comments.reverse();
        Ok(comments)
    }

    pub fn thread(&self, viewer: Option<&User>, prompt_id: &str) -> Result<CommentThread> {
        let conn = self.ctx.db.connection()?;
        let prompt = visible_prompt(&conn, viewer, prompt_id)?;
        Ok(build_thread(CommentStore::new(&conn).for_prompt(&prompt.id)?))
    }
}

/// Arrange comments (in creation order) into a thread.
///
/// Roots come newest first with their active replies oldest first. A deleted
/// root stays as a placeholder only while it has active replies.
pub(crate) fn build_thread(comments: Vec<Comment>) -> CommentThread {
    let mut roots = Vec::new();
    let mut replies: HashMap<String, Vec<Comment>> = HashMap::new();

    for comment in comments {
        match comment.parent_id.clone() {
            Some(parent) => {
                if comment.is_active() {
                    replies.entry(parent).or_default().push(comment);
                }
            }
            None => roots.push(comment),
        }
    }

    let roots = roots
        .into_iter()
        .rev()
        .filter_map(|comment| {
            let replies = replies.remove(&comment.id).unwrap_or_default();
            (comment.is_active() || !replies.is_empty()).then_some(CommentNode { comment, replies })
        })
        .collect();

    CommentThread { roots }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{context, post, register, reload};
    use crate::types::DELETED_COMMENT_TEXT;
    use chrono::Duration;

    #[test]
    fn test_add_rewards_and_counts() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let bob = register(&ctx, "bob");
        let prompt = post(&ctx, &alice, "Discuss");

        let comment = ctx.comments().add(&bob, &prompt.id, "  Nice one  ", None).unwrap();
        assert_eq!(comment.content, "Nice one");
        assert_eq!(comment.author_name, "bob");
        assert_eq!(reload(&ctx, &bob).points, 103);
        assert_eq!(ctx.prompts().get(&prompt.id).unwrap().stats.comments, 1);
    }

    #[test]
    fn test_add_validates_content() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let prompt = post(&ctx, &alice, "Discuss");
        let comments = ctx.comments();

        assert!(matches!(
            comments.add(&alice, &prompt.id, "   ", None),
            Err(HubError::Validation(_))
        ));
        assert!(comments.add(&alice, &prompt.id, &"x".repeat(501), None).is_err());
        assert!(matches!(
            comments.add(&alice, "missing", "hi", None),
            Err(HubError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reply_to_reply_attaches_to_root() {
        let (ctx, clock) = context();
        let alice = register(&ctx, "alice");
        let prompt = post(&ctx, &alice, "Deep");
        let comments = ctx.comments();

        let root = comments.add(&alice, &prompt.id, "root", None).unwrap();
        clock.advance(Duration::seconds(1));
        let reply = comments.add(&alice, &prompt.id, "reply", Some(&root.id)).unwrap();
        clock.advance(Duration::seconds(1));
        let nested = comments.add(&alice, &prompt.id, "nested", Some(&reply.id)).unwrap();

        assert_eq!(reply.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(nested.parent_id.as_deref(), Some(root.id.as_str()));

        let thread = comments.thread(None, &prompt.id).unwrap();
        assert_eq!(thread.roots.len(), 1);
        let replies: Vec<&str> = thread.roots[0].replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(replies, vec!["reply", "nested"]);
    }

    #[test]
    fn test_parent_must_belong_to_prompt() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let one = post(&ctx, &alice, "One");
        let two = post(&ctx, &alice, "Two");
        let comments = ctx.comments();

        let root = comments.add(&alice, &one.id, "on one", None).unwrap();
        assert!(matches!(
            comments.add(&alice, &two.id, "cross", Some(&root.id)),
            Err(HubError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_is_soft_and_author_only() {
        let (ctx, clock) = context();
        let alice = register(&ctx, "alice");
        let bob = register(&ctx, "bob");
        let prompt = post(&ctx, &alice, "Thread");
        let comments = ctx.comments();

        let root = comments.add(&alice, &prompt.id, "root", None).unwrap();
        clock.advance(Duration::seconds(1));
        comments.add(&bob, &prompt.id, "reply", Some(&root.id)).unwrap();
        clock.advance(Duration::seconds(1));
        let lonely = comments.add(&bob, &prompt.id, "lonely", None).unwrap();

        assert!(matches!(comments.delete(&bob, &root.id), Err(HubError::Forbidden(_))));
        comments.delete(&alice, &root.id).unwrap();
        comments.delete(&bob, &lonely.id).unwrap();

        assert_eq!(ctx.prompts().get(&prompt.id).unwrap().stats.comments, 1);
        let thread = comments.thread(None, &prompt.id).unwrap();
        assert_eq!(thread.roots.len(), 1);
        assert_eq!(thread.roots[0].comment.content, DELETED_COMMENT_TEXT);
        assert_eq!(thread.active_count(), 1);
        assert_eq!(comments.list(None, &prompt.id).unwrap().len(), 1);
    }

    #[test]
    fn test_thread_orders_roots_newest_first() {
        let (ctx, clock) = context();
        let alice = register(&ctx, "alice");
        let prompt = post(&ctx, &alice, "Order");
        let comments = ctx.comments();

        for text in ["first", "second", "third"] {
            comments.add(&alice, &prompt.id, text, None).unwrap();
            clock.advance(Duration::seconds(1));
        }
        let thread = comments.thread(None, &prompt.id).unwrap();
        let roots: Vec<&str> = thread.roots.iter().map(|n| n.comment.content.as_str()).collect();
        assert_eq!(roots, vec!["third", "second", "first"]);
        assert_eq!(comments.list(None, &prompt.id).unwrap()[0].content, "third");
    }

    #[test]
    fn test_archived_prompt_comments_visible_to_author_only() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let bob = register(&ctx, "bob");
        let prompt = post(&ctx, &alice, "Hidden");
        let comments = ctx.comments();
        comments.add(&bob, &prompt.id, "before archive", None).unwrap();
        ctx.prompts().archive(&alice, &prompt.id).unwrap();

        assert!(matches!(
            comments.list(Some(&bob), &prompt.id),
            Err(HubError::NotFound { .. })
        ));
        assert!(matches!(
            comments.thread(None, &prompt.id),
            Err(HubError::NotFound { .. })
        ));
        assert_eq!(comments.list(Some(&alice), &prompt.id).unwrap().len(), 1);
        assert_eq!(comments.thread(Some(&alice), &prompt.id).unwrap().active_count(), 1);
    }

    #[test]
    fn test_unknown_prompt_has_no_comments() {
        let (ctx, _) = context();
        let comments = ctx.comments();

        assert!(matches!(
            comments.thread(None, "no-such-prompt"),
            Err(HubError::NotFound { .. })
        ));
        assert!(matches!(
            comments.list(None, "no-such-prompt"),
            Err(HubError::NotFound { .. })
        ));
    }

    #[test]
    fn test_comment_like_toggles() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let bob = register(&ctx, "bob");
        let prompt = post(&ctx, &alice, "Likes");
        let comment = ctx.comments().add(&alice, &prompt.id, "like me", None).unwrap();

        let comments = ctx.comments();
        assert_eq!(
            comments.toggle_like(&bob, &comment.id).unwrap(),
            ToggleOutcome { active: true, count: 1 }
        );
        assert_eq!(
            comments.toggle_like(&alice, &comment.id).unwrap(),
            ToggleOutcome { active: true, count: 2 }
        );
        assert_eq!(
            comments.toggle_like(&bob, &comment.id).unwrap(),
            ToggleOutcome { active: false, count: 1 }
        );
    }
}
