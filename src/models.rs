//! Data models for the check-in run.
//!
//! This module contains the core data structures shared by the runner,
//! the reporter and the session client: accounts, roles, capacity
//! snapshots and the results of the individual sign-in calls.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Bytes per megabyte, as used for delta lines.
const MB: f64 = 1024.0 * 1024.0;

/// Bytes per gigabyte, as used for before/after totals.
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Message reported when the filter excludes every family of an account.
pub const NOT_A_MEMBER: &str = "not a member of the configured family group";

/// Message reported when no family sign-in had any effect.
pub const REPEATED_FAMILY_SIGN: &str = "repeated invalid family sign-in";

/// A configured account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Login name, also the identity key of the account.
    #[serde(default, alias = "userName")]
    pub user_name: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
}

impl Account {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    /// Whether both credentials are present. Incomplete accounts are skipped.
    pub fn is_complete(&self) -> bool {
        !self.user_name.is_empty() && !self.password.is_empty()
    }

    /// User name with the middle characters redacted for display.
    pub fn masked_name(&self) -> String {
        mask(&self.user_name, 3, 7)
    }
}

/// Replace the characters in `start..end` with `*`.
///
/// Works on characters rather than bytes, so non-ASCII names are safe.
pub fn mask(s: &str, start: usize, end: usize) -> String {
    s.chars()
        .enumerate()
        .map(|(i, c)| if i >= start && i < end { '*' } else { c })
        .collect()
}

/// Role of an account, derived from its position in the account list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Main account: personal sign-in, single family sign-in, full report.
    Primary,
    /// Secondary account: concurrent family sign-in only, summary report.
    NonPrimary,
}

impl Role {
    /// Role of the account at `index` given the number of primary accounts.
    pub fn of(index: usize, account_person: usize) -> Self {
        if index < account_person {
            Role::Primary
        } else {
            Role::NonPrimary
        }
    }

    pub fn is_primary(self) -> bool {
        self == Role::Primary
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::NonPrimary => write!(f, "non-primary"),
        }
    }
}

/// Format `value` with `places` decimals, rounding halves away from zero.
///
/// `format!("{:.N}")` rounds ties to even, which turns 0.125 into "0.12".
pub fn fixed(value: f64, places: usize) -> String {
    let scale = 10f64.powi(places as i32);
    format!("{:.*}", places, (value * scale).round() / scale)
}

/// Storage totals of an account at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub personal_total_bytes: u64,
    pub family_total_bytes: u64,
}

impl CapacitySnapshot {
    pub fn new(personal_total_bytes: u64, family_total_bytes: u64) -> Self {
        Self {
            personal_total_bytes,
            family_total_bytes,
        }
    }

    /// Personal total in gigabytes.
    pub fn personal_gb(&self) -> f64 {
        self.personal_total_bytes as f64 / GB
    }

    /// Family total in gigabytes.
    pub fn family_gb(&self) -> f64 {
        self.family_total_bytes as f64 / GB
    }

    /// Megabyte increase from `before` to `self`, as `(personal, family)`.
    ///
    /// Computed on the signed difference so a shrinking quota yields a
    /// negative value instead of wrapping.
    pub fn delta_mb(&self, before: &CapacitySnapshot) -> (f64, f64) {
        let personal = self.personal_total_bytes as f64 - before.personal_total_bytes as f64;
        let family = self.family_total_bytes as f64 - before.family_total_bytes as f64;
        (personal / MB, family / MB)
    }
}

/// Result of the personal sign-in call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSignResult {
    /// The account had already signed in today.
    pub already_signed: bool,
    /// Bonus space in megabytes.
    pub bonus_mb: u64,
}

impl UserSignResult {
    /// Report line for this result.
    pub fn message(&self) -> String {
        if self.already_signed {
            format!("Personal sign-in (already signed): {}M", self.bonus_mb)
        } else {
            format!("Personal sign-in: {}M", self.bonus_mb)
        }
    }
}

/// A family group the account belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyInfo {
    pub family_id: String,
    pub name: Option<String>,
}

/// Bonus granted by a family sign-in.
///
/// The service usually answers with a number of megabytes but is known to
/// send free text in some situations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BonusSpace {
    Amount(u64),
    Text(String),
}

impl fmt::Display for BonusSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BonusSpace::Amount(n) => write!(f, "{}", n),
            BonusSpace::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Result of one family sign-in call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySignResult {
    /// The sign-in had no effect because it was already done.
    pub already_satisfied: bool,
    pub bonus_space: BonusSpace,
}

/// Outcome of the family check-in of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOutcome {
    /// Nothing new happened.
    Absent,
    /// Bonus amounts (MB) of the sign-ins that took effect.
    Amounts(Vec<u64>),
    /// Free-form message, reported verbatim.
    Message(String),
}

impl FamilyOutcome {
    /// Build an outcome from the bonuses of the newly effective sign-ins.
    pub fn from_bonuses(bonuses: Vec<BonusSpace>) -> Self {
        if bonuses.is_empty() {
            return FamilyOutcome::Absent;
        }

        let amounts: Option<Vec<u64>> = bonuses
            .iter()
            .map(|b| match b {
                BonusSpace::Amount(n) => Some(*n),
                BonusSpace::Text(_) => None,
            })
            .collect();

        match amounts {
            Some(amounts) => FamilyOutcome::Amounts(amounts),
            None => FamilyOutcome::Message(
                bonuses
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        }
    }

    /// Report line for this outcome.
    pub fn summary(&self) -> String {
        match self {
            FamilyOutcome::Absent => REPEATED_FAMILY_SIGN.to_string(),
            FamilyOutcome::Amounts(amounts) => format!(
                "{} effective family sign-ins (M): {}",
                amounts.len(),
                amounts
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            FamilyOutcome::Message(message) => message.clone(),
        }
    }
}

/// Accepts an id sent either as a JSON number or a string.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Str(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Num(n) => n.to_string(),
        IdRepr::Str(s) => s,
    })
}
