use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered community member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string, never serialized to output
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Cached balance; always equals the sum of the user's ledger entries
    pub points: i64,
    pub login_streak: u32,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: UserStatus,
}

impl User {
    pub fn level(&self) -> UserLevel {
        UserLevel::from_points(self.points)
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Banned,
}

/// Level ladder derived from the current balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserLevel {
    Rookie,
    Contributor,
    Influencer,
    Master,
    Legend,
}

impl UserLevel {
    /// Minimum balance for each level, highest first
    const THRESHOLDS: [(i64, UserLevel); 5] = [
        (10_000, UserLevel::Legend),
        (2_000, UserLevel::Master),
        (500, UserLevel::Influencer),
        (100, UserLevel::Contributor),
        (0, UserLevel::Rookie),
    ];

    pub fn from_points(points: i64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(min, _)| points >= *min)
            .map(|(_, level)| *level)
            .unwrap_or(UserLevel::Rookie)
    }

    /// Extra free detail views per day granted at this level
    pub fn bonus_free_views(self) -> u32 {
        match self {
            UserLevel::Rookie => 0,
            UserLevel::Contributor => 5,
            UserLevel::Influencer => 10,
            UserLevel::Master => 15,
            UserLevel::Legend => 20,
        }
    }

    /// Points needed to reach the next level, if any
    pub fn next_threshold(self) -> Option<i64> {
        match self {
            UserLevel::Rookie => Some(100),
            UserLevel::Contributor => Some(500),
            UserLevel::Influencer => Some(2_000),
            UserLevel::Master => Some(10_000),
            UserLevel::Legend => None,
        }
    }
}

impl std::fmt::Display for UserLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserLevel::Rookie => write!(f, "Rookie"),
            UserLevel::Contributor => write!(f, "Contributor"),
            UserLevel::Influencer => write!(f, "Influencer"),
            UserLevel::Master => write!(f, "Master"),
            UserLevel::Legend => write!(f, "Legend"),
        }
    }
}

/// Logged-in session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: super::SessionToken,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Aggregated view of a user for profile pages
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub level: UserLevel,
    pub prompt_count: u64,
    pub likes_received: u64,
    pub free_views_left_today: u32,
    pub earned_today: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(UserLevel::from_points(0), UserLevel::Rookie);
        assert_eq!(UserLevel::from_points(99), UserLevel::Rookie);
        assert_eq!(UserLevel::from_points(100), UserLevel::Contributor);
        assert_eq!(UserLevel::from_points(499), UserLevel::Contributor);
        assert_eq!(UserLevel::from_points(500), UserLevel::Influencer);
        assert_eq!(UserLevel::from_points(2_000), UserLevel::Master);
        assert_eq!(UserLevel::from_points(10_000), UserLevel::Legend);
        assert_eq!(UserLevel::from_points(-5), UserLevel::Rookie);
    }

    #[test]
    fn test_bonus_views_grow_with_level() {
        assert_eq!(UserLevel::Rookie.bonus_free_views(), 0);
        assert_eq!(UserLevel::Contributor.bonus_free_views(), 5);
        assert_eq!(UserLevel::Legend.bonus_free_views(), 20);
        assert!(UserLevel::Master > UserLevel::Influencer);
    }

    #[test]
    fn test_next_threshold_matches_ladder() {
        for points in [0, 150, 700, 3_000] {
            let level = UserLevel::from_points(points);
            let next = level.next_threshold().unwrap();
            assert!(UserLevel::from_points(next) > level);
            assert_eq!(UserLevel::from_points(next - 1), level);
        }
        assert_eq!(UserLevel::Legend.next_threshold(), None);
    }
}
