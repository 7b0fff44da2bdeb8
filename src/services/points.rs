//! Points ledger, rewards and the detail-view entitlement.
//!
//! The `*_in` functions operate on a connection the caller already holds so
//! they can join the caller's transaction; the public wrappers open their own.

use rusqlite::Connection;
use tracing::{debug, info};

use super::ServiceContext;
use crate::storage::{InteractionStore, LedgerStore, PromptStore, UserStore};
use crate::types::{
    BalanceMismatch, HubError, LedgerEntry, PointReason, Prompt, Result,
    StatField, User, ViewCharge, to_timestamp,
};

pub struct PointsService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PointsService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Grant a one-time reward; returns the points actually awarded
    pub fn grant(
        &self,
        user_id: &str,
        reason: PointReason,
        reference: &str,
        amount: i64,
    ) -> Result<i64> {
        self.ctx
            .db
            .transaction(|conn| self.grant_in(conn, user_id, reason, reference, amount))
    }

    /// Grant inside an open transaction.
    ///
    /// Repeats of (user, reason, reference) award nothing. Capped rewards are
    /// clamped to what is left of today's earn limit; a grant clamped to zero
    /// leaves no ledger row.
    pub(crate) fn grant_in(
        &self,
        conn: &Connection,
        user_id: &str,
        reason: PointReason,
        reference: &str,
        amount: i64,
    ) -> Result<i64> {
        if amount <= 0 {
            return Ok(0);
        }

        let ledger = LedgerStore::new(conn);
        if ledger.exists(user_id, reason, reference)? {
            debug!(user_id, ?reason, reference, "Reward already granted");
            return Ok(0);
        }

        let mut award = amount;
        if reason.is_capped() {
            let earned = ledger.capped_earned_in(user_id, self.ctx.today())?;
            let remaining = (self.ctx.config.points.daily_limit - earned).max(0);
            award = award.min(remaining);
            if award == 0 {
                info!(user_id, ?reason, "Daily earn limit reached, reward skipped");
                return Ok(0);
            }
        }

        let now = to_timestamp(self.ctx.now());
        if !ledger.append(user_id, award, reason, reference, now)? {
            return Ok(0);
        }
        let balance = UserStore::new(conn).add_points(user_id, award, now)?;
        info!(user_id, ?reason, award, balance, "Points granted");
        Ok(award)
    }

    /// Spend points; returns the balance afterwards
    pub fn spend(
        &self,
        user_id: &str,
        reason: PointReason,
        reference: &str,
        cost: i64,
    ) -> Result<i64> {
        self.ctx
            .db
            .transaction(|conn| self.spend_in(conn, user_id, reason, reference, cost))
    }

    pub(crate) fn spend_in(
        &self,
        conn: &Connection,
        user_id: &str,
        reason: PointReason,
        reference: &str,
        cost: i64,
    ) -> Result<i64> {
        let users = UserStore::new(conn);
        let available = users
            .points(user_id)?
            .ok_or_else(|| HubError::not_found("user", user_id))?;
        if cost <= 0 {
            return Ok(available);
        }
        if available < cost {
            return Err(HubError::InsufficientPoints {
                required: cost,
                available,
            });
        }

        let now = to_timestamp(self.ctx.now());
        if !LedgerStore::new(conn).append(user_id, -cost, reason, reference, now)? {
            return Err(HubError::Storage(format!(
                "Duplicate charge {:?} for '{}'",
                reason, reference
            )));
        }
        let balance = users.add_points(user_id, -cost, now)?;
        debug!(user_id, ?reason, cost, balance, "Points spent");
        Ok(balance)
    }

    /// Cached balance
    pub fn balance(&self, user_id: &str) -> Result<i64> {
        let conn = self.ctx.db.connection()?;
        UserStore::new(&conn)
            .points(user_id)?
            .ok_or_else(|| HubError::not_found("user", user_id))
    }

    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<LedgerEntry>> {
        let conn = self.ctx.db.connection()?;
        LedgerStore::new(&conn).history(user_id, limit)
    }

    /// Capped rewards earned today
    pub fn earned_today(&self, user_id: &str) -> Result<i64> {
        let conn = self.ctx.db.connection()?;
        LedgerStore::new(&conn).capped_earned_in(user_id, self.ctx.today())
    }

    /// Users whose cached balance disagrees with their ledger sum
    pub fn audit(&self) -> Result<Vec<BalanceMismatch>> {
        let conn = self.ctx.db.connection()?;
        Self::find_mismatches(&conn)
    }

    /// Reset mismatched balances to their ledger sums; returns what was fixed
    pub fn repair(&self) -> Result<Vec<BalanceMismatch>> {
        self.ctx.db.transaction(|conn| {
            let mismatches = Self::find_mismatches(conn)?;
            let users = UserStore::new(conn);
            for m in &mismatches {
                users.set_points(&m.user_id, m.ledger.max(0))?;
                info!(user_id = %m.user_id, cached = m.cached, ledger = m.ledger, "Balance repaired");
            }
            Ok(mismatches)
        })
    }

    fn find_mismatches(conn: &Connection) -> Result<Vec<BalanceMismatch>> {
        let totals = LedgerStore::new(conn).totals_by_user()?;
        let users = UserStore::new(conn).all()?;

        Ok(users
            .into_iter()
            .filter_map(|user| {
                let ledger = totals
                    .iter()
                    .find(|(id, _)| *id == user.id)
                    .map(|(_, total)| *total)
                    .unwrap_or(0);
                (ledger != user.points).then(|| BalanceMismatch {
                    user_id: user.id,
                    username: user.username,
                    cached: user.points,
                    ledger,
                })
            })
            .collect())
    }

    // =========================================================================
    // Viewing entitlement
    // =========================================================================

    /// Daily free views for the user (base quota plus level bonus)
    pub fn daily_quota(&self, user: &User) -> u32 {
        let viewing = &self.ctx.config.viewing;
        let bonus = if viewing.level_bonus {
            user.level().bonus_free_views()
        } else {
            0
        };
        viewing.free_views_per_day.saturating_add(bonus)
    }

    /// Free views the user has left today
    pub fn free_views_left(&self, user: &User) -> Result<u32> {
        let conn = self.ctx.db.connection()?;
        let used = InteractionStore::new(&conn).views_in(
            &user.id,
            self.ctx.today(),
            !self.ctx.config.viewing.own_prompts_free,
        )?;
        Ok(self.daily_quota(user).saturating_sub(used))
    }

    /// Authorize and record one detail view
    pub fn consume_view(&self, user: &User, prompt: &Prompt) -> Result<ViewCharge> {
        self.ctx
            .db
            .transaction(|conn| self.consume_view_in(conn, user, prompt))
    }

    /// Decide how the view is paid for, charge if needed, then append the
    /// view event and bump the counter. A denied view records nothing.
    pub(crate) fn consume_view_in(
        &self,
        conn: &Connection,
        user: &User,
        prompt: &Prompt,
    ) -> Result<ViewCharge> {
        let viewing = &self.ctx.config.viewing;
        let interactions = InteractionStore::new(conn);
        let now = to_timestamp(self.ctx.now());

        let own = prompt.is_authored_by(&user.id);
        let charge = if viewing.own_prompts_free && own {
            interactions.record_view(&user.id, &prompt.id, true, now)?;
            ViewCharge::OwnPrompt
        } else {
            // Level from the live balance, not the caller's possibly stale copy
            let balance = UserStore::new(conn)
                .points(&user.id)?
                .ok_or_else(|| HubError::not_found("user", &user.id))?;
            let current = User {
                points: balance,
                ..user.clone()
            };
            let quota = self.daily_quota(&current);
            let used = interactions.views_in(&user.id, self.ctx.today(), !viewing.own_prompts_free)?;

            if used < quota {
                interactions.record_view(&user.id, &prompt.id, own, now)?;
                ViewCharge::Free {
                    remaining: quota - used - 1,
                }
            } else {
                let cost = viewing.cost_per_view;
                if balance < cost {
                    return Err(HubError::InsufficientPoints {
                        required: cost,
                        available: balance,
                    });
                }
                let view_id = interactions.record_view(&user.id, &prompt.id, own, now)?;
                let balance = self.spend_in(
                    conn,
                    &user.id,
                    PointReason::ViewCharge,
                    &format!("view:{}", view_id),
                    cost,
                )?;
                ViewCharge::Paid { cost, balance }
            }
        };

        PromptStore::new(conn).adjust_stat(&prompt.id, StatField::Views, 1)?;
        debug!(user_id = %user.id, prompt_id = %prompt.id, ?charge, "View recorded");
        Ok(charge)
    }
}
