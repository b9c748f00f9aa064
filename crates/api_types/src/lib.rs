//! Records exchanged with the hosted finance backend.
//!
//! Field names follow the remote tables (`transactions`, `budgets`,
//! `categories`) so rows can be (de)serialized as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use money::{AmountError, MoneyCents};

mod money;

/// Lenient (de)serialization for calendar columns.
///
/// The backend may expose a column as `timestamptz` (RFC 3339), `timestamp`
/// (no offset, read as UTC) or `date` (read as midnight UTC).
pub mod date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// Parses a calendar value from the backend.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(parsed.and_utc());
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(parsed.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
    }
}

pub mod transaction {
    use super::*;

    /// Direction of a transaction. The amount is a magnitude, the kind says
    /// whether it adds to income or to expenses.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    impl TransactionKind {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
            }
        }
    }

    impl std::str::FromStr for TransactionKind {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "income" => Ok(Self::Income),
                "expense" => Ok(Self::Expense),
                other => Err(format!("unknown transaction type: {other}")),
            }
        }
    }

    /// A persisted transaction row.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Transaction {
        pub id: Uuid,
        pub description: String,
        pub amount: MoneyCents,
        pub category: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        #[serde(deserialize_with = "crate::date::deserialize")]
        pub date: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub user_id: Option<Uuid>,
    }

    /// Insert payload: a transaction before the backend assigns its id.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct NewTransaction {
        pub description: String,
        pub amount: MoneyCents,
        pub category: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub date: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub user_id: Option<Uuid>,
    }

    impl NewTransaction {
        /// Returns the payload stamped with the owning user.
        #[must_use]
        pub fn owned_by(mut self, user_id: Uuid) -> Self {
            self.user_id = Some(user_id);
            self
        }
    }
}

pub mod budget {
    use super::*;

    /// Spending limit for one category over one month.
    ///
    /// `category` is the natural key used by updates.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Budget {
        pub id: Uuid,
        pub category: String,
        pub limit: MoneyCents,
        pub spent: MoneyCents,
        #[serde(deserialize_with = "crate::date::deserialize")]
        pub month: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub user_id: Option<Uuid>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Category {
        pub id: Uuid,
        pub name: String,
        pub icon: String,
        pub color: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub user_id: Option<Uuid>,
    }
}

pub mod summary {
    use super::*;

    /// Derived totals shown on the dashboard. Never persisted.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
    pub struct FinancialSummary {
        pub total_income: MoneyCents,
        pub total_expenses: MoneyCents,
        pub net_savings: MoneyCents,
        pub monthly_budget: MoneyCents,
    }
}

pub mod auth {
    use super::*;

    /// The authenticated identity as reported by the auth service.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct User {
        pub id: Uuid,
        #[serde(default)]
        pub email: Option<String>,
    }

    /// A signed-in session. Tokens are opaque to the client.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Session {
        pub access_token: String,
        #[serde(default)]
        pub refresh_token: Option<String>,
        /// Unix timestamp (seconds).
        #[serde(default)]
        pub expires_at: Option<i64>,
        pub user: User,
    }
}
