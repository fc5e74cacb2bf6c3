//! # Avolve Core Library
//!
//! Reward economy logic for the Avolve community platform: the streak bonus
//! calculator, a token ledger that applies it, peer recognition, the
//! onboarding checklist and invitation codes. The `avolve-cli` binary is a
//! thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Rewards**: the pure streak bonus table, streak counters, token types
//! - **Storage**: SQLite ledger with a cached balance per token and TOML
//!   configuration
//! - **Onboarding**: an ordered checklist that gates each step on the ones
//!   before it
//! - **Invitations**: hashed invitation codes and a sliding-window rate
//!   limiter for code checks
//!
//! ## Key Components
//!
//! - [`streak_bonus_multiplier`]: streak length to reward multiplier
//! - [`Database`]: ledger, streaks, onboarding and invitation persistence
//! - [`Config`]: application configuration management
//! - [`RateLimiter`]: invitation-check throttling

pub mod error;
pub mod invitation;
pub mod onboarding;
pub mod rewards;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, LedgerError, OnboardingError, ValidationError};
pub use invitation::{CodeStatus, Invitation, RateDecision, RateLimiter};
pub use onboarding::{OnboardingProgress, OnboardingStep, StepOutcome};
pub use rewards::{
    apply_streak_bonus, streak_bonus_multiplier, Balances, Recognition, StreakState, StreakStatus,
    TokenTransaction, TokenType, TransactionKind,
};
pub use storage::{BalanceMismatch, Config, Database, OnboardingCompletion, RewardClaim};
