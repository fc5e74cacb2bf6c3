//! Token and transaction types for the reward economy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// The three tokens members can earn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    /// Platform-wide community token.
    Gen,
    /// Superachiever playbook token.
    Sap,
    /// Personal success puzzle token.
    Psp,
}

impl TokenType {
    pub const ALL: [TokenType; 3] = [TokenType::Gen, TokenType::Sap, TokenType::Psp];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Gen => "GEN",
            TokenType::Sap => "SAP",
            TokenType::Psp => "PSP",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GEN" => Ok(TokenType::Gen),
            "SAP" => Ok(TokenType::Sap),
            "PSP" => Ok(TokenType::Psp),
            other => Err(ValidationError::InvalidValue {
                field: "token".into(),
                message: format!("unknown token '{other}' (expected GEN, SAP or PSP)"),
            }),
        }
    }
}

/// Why a ledger entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Reward,
    Recognition,
    Onboarding,
    Spend,
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Reward => "reward",
            TransactionKind::Recognition => "recognition",
            TransactionKind::Onboarding => "onboarding",
            TransactionKind::Spend => "spend",
            TransactionKind::Adjustment => "adjustment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reward" => Some(TransactionKind::Reward),
            "recognition" => Some(TransactionKind::Recognition),
            "onboarding" => Some(TransactionKind::Onboarding),
            "spend" => Some(TransactionKind::Spend),
            "adjustment" => Some(TransactionKind::Adjustment),
            _ => None,
        }
    }
}

/// A single ledger entry. Credits are positive, spends negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransaction {
    pub id: String,
    pub user_id: String,
    pub token: TokenType,
    pub kind: TransactionKind,
    pub amount: i64,
    pub reason: String,
    /// Other member involved (the sender, for recognitions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    /// Streak the bonus was computed from (streak-boosted rewards only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<i64>,
    /// Multiplier applied to the base amount (streak-boosted rewards only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl TokenTransaction {
    /// Create an entry stamped now with a fresh id.
    pub fn new(
        user_id: impl Into<String>,
        token: TokenType,
        kind: TransactionKind,
        amount: i64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            token,
            kind,
            amount,
            reason: reason.into(),
            counterparty: None,
            streak: None,
            multiplier: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the streak and multiplier a reward was computed from.
    pub fn with_bonus(mut self, streak: i64, multiplier: f64) -> Self {
        self.streak = Some(streak);
        self.multiplier = Some(multiplier);
        self
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Balances for one member across all tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Balances {
    pub gen: i64,
    pub sap: i64,
    pub psp: i64,
}

impl Balances {
    pub fn set(&mut self, token: TokenType, amount: i64) {
        match token {
            TokenType::Gen => self.gen = amount,
            TokenType::Sap => self.sap = amount,
            TokenType::Psp => self.psp = amount,
        }
    }
}
