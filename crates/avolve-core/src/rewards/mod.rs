//! Token economy: streak bonuses, streak tracking, token types and recognition.
//!
//! The ledger that persists these lives in [`crate::storage::Database`].

pub mod recognition;
pub mod streak;
pub mod streak_bonus;
pub mod token;

pub use recognition::Recognition;
pub use streak::{StreakState, StreakStatus, StreakUpdate};
pub use streak_bonus::{apply_streak_bonus, streak_bonus_multiplier};
pub use token::{Balances, TokenTransaction, TokenType, TransactionKind};
