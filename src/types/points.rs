use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a ledger entry was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointReason {
    WelcomeBonus,
    DailyLogin,
    PromptCreated,
    LikeReceived,
    CommentCreated,
    PromptShared,
    ViewCharge,
}

impl PointReason {
    pub const ALL: [PointReason; 7] = [
        PointReason::WelcomeBonus,
        PointReason::DailyLogin,
        PointReason::PromptCreated,
        PointReason::LikeReceived,
        PointReason::CommentCreated,
        PointReason::PromptShared,
        PointReason::ViewCharge,
    ];

    /// Rewards that count toward the daily earn cap
    pub fn is_capped(self) -> bool {
        !matches!(self, PointReason::WelcomeBonus | PointReason::ViewCharge)
    }

    pub fn label(self) -> &'static str {
        match self {
            PointReason::WelcomeBonus => "welcome bonus",
            PointReason::DailyLogin => "daily login",
            PointReason::PromptCreated => "prompt created",
            PointReason::LikeReceived => "like received",
            PointReason::CommentCreated => "comment written",
            PointReason::PromptShared => "prompt shared",
            PointReason::ViewCharge => "detail view",
        }
    }
}

/// One row of the points ledger
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub delta: i64,
    pub reason: PointReason,
    /// What the entry refers to (prompt id, comment id, date, ...)
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

/// How a detail view was paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewCharge {
    /// Viewer is the author
    OwnPrompt,
    /// Covered by the daily quota
    Free { remaining: u32 },
    /// Paid with points
    Paid { cost: i64, balance: i64 },
}

impl ViewCharge {
    pub fn is_paid(&self) -> bool {
        matches!(self, ViewCharge::Paid { .. })
    }
}

/// Cached balance that disagrees with the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceMismatch {
    pub user_id: String,
    pub username: String,
    pub cached: i64,
    pub ledger: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParseWithDefault, enum_to_str};

    #[test]
    fn test_reason_round_trip_through_storage_names() {
        for reason in PointReason::ALL {
            let stored = enum_to_str(&reason);
            assert_eq!(PointReason::try_parse(&stored), Some(reason));
        }
    }

    #[test]
    fn test_only_rewards_are_capped() {
        assert!(!PointReason::WelcomeBonus.is_capped());
        assert!(!PointReason::ViewCharge.is_capped());
        assert!(PointReason::LikeReceived.is_capped());
        assert!(PointReason::DailyLogin.is_capped());
    }

    #[test]
    fn test_view_charge_serializes_tagged() {
        let json = serde_json::to_value(ViewCharge::Paid {
            cost: 1,
            balance: 9,
        })
        .unwrap();
        assert_eq!(json["kind"], "paid");
        assert_eq!(json["balance"], 9);
    }
}
