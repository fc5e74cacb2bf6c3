//! Peer recognition: one member crediting tokens to another.

use serde::{Deserialize, Serialize};

use super::token::TokenType;
use crate::error::{CoreError, LedgerError, ValidationError};

/// Longest allowed recognition message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 280;

/// A recognition request before it reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    pub from: String,
    pub to: String,
    pub token: TokenType,
    pub amount: i64,
    pub message: String,
}

impl Recognition {
    /// Check the request is well-formed. Daily limits are enforced by the ledger.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.from.trim().is_empty() {
            return Err(ValidationError::Empty("from".into()).into());
        }
        if self.to.trim().is_empty() {
            return Err(ValidationError::Empty("to".into()).into());
        }
        if self.from == self.to {
            return Err(LedgerError::SelfRecognition.into());
        }
        if self.amount <= 0 {
            return Err(ValidationError::NonPositiveAmount(self.amount).into());
        }
        let message = self.message.trim();
        if message.is_empty() {
            return Err(ValidationError::Empty("message".into()).into());
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ValidationError::TooLong {
                field: "message".into(),
                max: MAX_MESSAGE_CHARS,
            }
            .into());
        }
        Ok(())
    }

    /// Reason text stored on the recipient's ledger entry.
    pub fn ledger_reason(&self) -> String {
        format!("recognized by {}: {}", self.from, self.message.trim())
    }
}
