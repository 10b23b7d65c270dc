// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    /// Unknown values fall back to `Free`.
    pub fn from_db(value: &str) -> Self {
        match value {
            "pro" => Plan::Pro,
            _ => Plan::Free,
        }
    }
}

/// Exam-related slice of the 'users' table.
#[derive(Debug, Clone, FromRow)]
pub struct UserStatsRow {
    pub id: i64,
    pub plan: String,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub tests_used: i64,
    pub total_tests: i64,
    pub total_correct: i64,
    pub total_wrong: i64,
}

/// Persistent counters the exam core reads and increments.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub id: i64,
    pub plan: Plan,
    pub plan_expires_at: Option<DateTime<Utc>>,
    /// Lifetime number of exams counted against the free plan.
    pub tests_used: i64,
    pub total_tests: i64,
    pub total_correct: i64,
    pub total_wrong: i64,
}

impl From<UserStatsRow> for UserStats {
    fn from(row: UserStatsRow) -> Self {
        Self {
            id: row.id,
            plan: Plan::from_db(&row.plan),
            plan_expires_at: row.plan_expires_at,
            tests_used: row.tests_used,
            total_tests: row.total_tests,
            total_correct: row.total_correct,
            total_wrong: row.total_wrong,
        }
    }
}

impl UserStats {
    pub fn new(id: i64, plan: Plan) -> Self {
        Self {
            id,
            plan,
            plan_expires_at: None,
            tests_used: 0,
            total_tests: 0,
            total_correct: 0,
            total_wrong: 0,
        }
    }

    /// A pro plan without an end date never lapses.
    pub fn has_active_pro(&self, now: DateTime<Utc>) -> bool {
        self.plan == Plan::Pro && self.plan_expires_at.is_none_or(|end| end > now)
    }

    /// How many more exams the user may start.
    pub fn test_allowance(&self, free_limit: i64, now: DateTime<Utc>) -> TestAllowance {
        if self.has_active_pro(now) {
            return TestAllowance {
                plan: Plan::Pro,
                tests_used: self.tests_used,
                limit: None,
                remaining: None,
            };
        }

        TestAllowance {
            plan: Plan::Free,
            tests_used: self.tests_used,
            limit: Some(free_limit),
            remaining: Some((free_limit - self.tests_used).max(0)),
        }
    }
}

/// Result of the plan check. `None` limits mean unlimited.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAllowance {
    pub plan: Plan,
    pub tests_used: i64,
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
}

impl TestAllowance {
    pub fn can_take(&self) -> bool {
        self.remaining.is_none_or(|r| r > 0)
    }
}
