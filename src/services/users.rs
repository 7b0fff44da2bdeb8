//! Profiles and the points leaderboard.

use super::ServiceContext;
use crate::storage::{PromptStore, UserStore};
use crate::types::{HubError, Result, User, UserProfile};

pub struct UserService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UserService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub fn get(&self, id: &str) -> Result<User> {
        let conn = self.ctx.db.connection()?;
        UserStore::new(&conn)
            .get(id)?
            .ok_or_else(|| HubError::not_found("user", id))
    }

    pub fn find_by_username(&self, username: &str) -> Result<User> {
        let conn = self.ctx.db.connection()?;
        UserStore::new(&conn)
            .find_by_username(username.trim())?
            .ok_or_else(|| HubError::not_found("user", username))
    }

    pub fn profile(&self, user_id: &str) -> Result<UserProfile> {
        let user = self.get(user_id)?;
        let (prompt_count, likes_received) = {
            let conn = self.ctx.db.connection()?;
            let prompts = PromptStore::new(&conn);
            (
                prompts.count_by_author(&user.id)?,
                prompts.likes_received(&user.id)?,
            )
        };
        let points = self.ctx.points();

        Ok(UserProfile {
            level: user.level(),
            prompt_count,
            likes_received,
            free_views_left_today: points.free_views_left(&user)?,
            earned_today: points.earned_today(&user.id)?,
            user,
        })
    }

    /// Active users by balance, ties by username
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<User>> {
        let conn = self.ctx.db.connection()?;
        UserStore::new(&conn).top_by_points(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{context, post, register};
    use crate::types::{UserLevel, UserStatus};

    #[test]
    fn test_profile_aggregates() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let bob = register(&ctx, "bob");
        let prompt = post(&ctx, &alice, "Profiled");
        post(&ctx, &alice, "Second");
        ctx.interactions().toggle_like(&bob, &prompt.id).unwrap();

        let profile = ctx.users().profile(&alice.id).unwrap();
        assert_eq!(profile.prompt_count, 2);
        assert_eq!(profile.likes_received, 1);
        assert_eq!(profile.user.points, 205);
        assert_eq!(profile.level, UserLevel::Contributor);
        assert_eq!(profile.earned_today, 105);
        assert_eq!(profile.free_views_left_today, 15);
    }

    #[test]
    fn test_leaderboard_orders_and_skips_banned() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let bob = register(&ctx, "bob");
        let carol = register(&ctx, "carol");
        post(&ctx, &carol, "Climb");
        ctx.auth().set_status(&bob.id, UserStatus::Banned).unwrap();

        let names: Vec<String> = ctx
            .users()
            .leaderboard(10)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["carol".to_string(), alice.username]);
    }

    #[test]
    fn test_unknown_user() {
        let (ctx, _) = context();
        assert!(matches!(ctx.users().get("nope"), Err(HubError::NotFound { .. })));
        assert!(ctx.users().find_by_username("ghost").is_err());
    }
}
