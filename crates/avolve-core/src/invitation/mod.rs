//! Invitation codes and the rate limiter guarding code checks.

pub mod code;
pub mod rate_limit;

pub use code::{code_digest, expiry_after, generate_code, new_code, normalize_code, CodeStatus, Invitation};
pub use rate_limit::{RateDecision, RateLimiter};
