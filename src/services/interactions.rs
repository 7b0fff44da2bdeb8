//! Likes, bookmarks, shares and detail views.

use rusqlite::Connection;
use tracing::{debug, info};

use super::{ServiceContext, visible_prompt};
use super::comments::build_thread;
use crate::storage::{CommentStore, InteractionStore, PromptStore};
use crate::types::{
    HubError, InteractionKind, PointReason, Prompt, PromptDetail, Result, ToggleOutcome, User,
    to_timestamp,
};

pub struct InteractionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> InteractionService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Like or unlike. The first like by someone other than the author pays
    /// the author once per liker.
    pub fn toggle_like(&self, user: &User, prompt_id: &str) -> Result<ToggleOutcome> {
        self.ctx.db.transaction(|conn| {
            let prompt = visible_prompt(conn, Some(user), prompt_id)?;
            let outcome = toggle(conn, user, &prompt, InteractionKind::Like, self.ctx)?;

            if outcome.active && !prompt.is_authored_by(&user.id) {
                self.ctx.points().grant_in(
                    conn,
                    &prompt.author_id,
                    PointReason::LikeReceived,
                    &format!("{}:{}", prompt.id, user.id),
                    self.ctx.config.points.like_received,
                )?;
            }
            Ok(outcome)
        })
    }

    pub fn toggle_bookmark(&self, user: &User, prompt_id: &str) -> Result<ToggleOutcome> {
        self.ctx.db.transaction(|conn| {
            let prompt = visible_prompt(conn, Some(user), prompt_id)?;
            toggle(conn, user, &prompt, InteractionKind::Bookmark, self.ctx)
        })
    }

    /// Record a share; guests may share too. Returns the new share count.
    pub fn record_share(&self, user: Option<&User>, prompt_id: &str) -> Result<u64> {
        self.ctx.db.transaction(|conn| {
            let prompts = PromptStore::new(conn);
            let prompt = visible_prompt(conn, user, prompt_id)?;

            let now = to_timestamp(self.ctx.now());
            InteractionStore::new(conn).record_event(
                user.map(|u| u.id.as_str()),
                &prompt.id,
                InteractionKind::Share,
                now,
            )?;
            let count = prompts.adjust_stat(&prompt.id, InteractionKind::Share.stat_field(), 1)?;

            if let Some(user) = user {
                self.ctx.points().grant_in(
                    conn,
                    &user.id,
                    PointReason::PromptShared,
                    &prompt.id,
                    self.ctx.config.points.prompt_shared,
                )?;
            }
            info!(prompt_id = %prompt.id, guest = user.is_none(), count, "Prompt shared");
            Ok(count)
        })
    }

    /// Open the detail page: pay for the view, then load everything the page shows
    pub fn open_prompt(&self, user: &User, prompt_id: &str) -> Result<PromptDetail> {
        self.ctx.db.transaction(|conn| {
            let prompt = visible_prompt(conn, Some(user), prompt_id)?;
            let charge = self.ctx.points().consume_view_in(conn, user, &prompt)?;

            let prompt = PromptStore::new(conn)
                .get(&prompt.id)?
                .ok_or_else(|| HubError::not_found("prompt", prompt_id))?;
            let interactions = InteractionStore::new(conn);
            let liked = interactions.exists(&user.id, &prompt.id, InteractionKind::Like)?;
            let bookmarked = interactions.exists(&user.id, &prompt.id, InteractionKind::Bookmark)?;
            let thread = build_thread(CommentStore::new(conn).for_prompt(&prompt.id)?);

            Ok(PromptDetail {
                prompt,
                charge,
                liked,
                bookmarked,
                thread,
            })
        })
    }

    /// (liked, bookmarked) for the user
    pub fn state(&self, user: &User, prompt_id: &str) -> Result<(bool, bool)> {
        let conn = self.ctx.db.connection()?;
        let interactions = InteractionStore::new(&conn);
        Ok((
            interactions.exists(&user.id, prompt_id, InteractionKind::Like)?,
            interactions.exists(&user.id, prompt_id, InteractionKind::Bookmark)?,
        ))
    }

    /// Published prompts the user bookmarked, most recently bookmarked first
    pub fn bookmarks(&self, user: &User) -> Result<Vec<Prompt>> {
        let conn = self.ctx.db.connection()?;
        PromptStore::new(&conn).bookmarked_by(&user.id)
    }

    /// Recompute all prompt counters from the ledgers; returns prompts fixed
    pub fn resync_counters(&self) -> Result<usize> {
        let changed = self
            .ctx
            .db
            .transaction(|conn| PromptStore::new(conn).resync_all())?;
        if changed > 0 {
            info!(changed, "Prompt counters resynchronized");
        }
        Ok(changed)
    }
}

/// Published prompt, or any prompt of the user's own
fn toggle(
    conn: &Connection,
    user: &User,
    prompt: &Prompt,
    kind: InteractionKind,
    ctx: &ServiceContext,
) -> Result<ToggleOutcome> {
    let interactions = InteractionStore::new(conn);
    let prompts = PromptStore::new(conn);

    let (active, delta) = if interactions.delete_toggle(&user.id, &prompt.id, kind)? {
        (false, -1)
    } else {
        let at = to_timestamp(ctx.now());
        interactions.insert_toggle(&user.id, &prompt.id, kind, at)?;
        (true, 1)
    };
    let count = prompts.adjust_stat(&prompt.id, kind.stat_field(), delta)?;
    debug!(user_id = %user.id, prompt_id = %prompt.id, ?kind, active, count, "Toggled");
    Ok(ToggleOutcome { active, count })
}
