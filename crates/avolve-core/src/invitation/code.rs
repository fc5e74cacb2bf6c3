//! Invitation codes.
//!
//! Codes are short, human-typeable strings. Only their SHA-256 digest is
//! stored, so a leaked table does not leak usable codes.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;
use crate::storage::config::MAX_TTL_DAYS;

/// Characters used in generated codes (no 0/O, 1/I/L).
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of a generated code, separators excluded.
pub const CODE_LEN: usize = 8;

/// Generate a code formatted as `XXXX-XXXX`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let raw: String = (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", &raw[..CODE_LEN / 2], &raw[CODE_LEN / 2..])
}

/// Generate a code from the thread-local RNG.
pub fn new_code() -> String {
    generate_code(&mut rand::thread_rng())
}

/// Canonical form used for hashing: trimmed, upper-case, no separators.
pub fn normalize_code(code: &str) -> String {
    code.trim()
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Hex SHA-256 of the normalized code.
pub fn code_digest(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_code(code).as_bytes());
    hex::encode(hasher.finalize())
}

/// Expiry for an invitation created at `now` that lives `ttl_days`; 0 means none.
///
/// # Errors
/// Returns [`ValidationError::InvalidValue`] for a negative lifetime or one
/// longer than [`MAX_TTL_DAYS`].
pub fn expiry_after(
    now: DateTime<Utc>,
    ttl_days: i64,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let invalid = || ValidationError::InvalidValue {
        field: "ttl_days".into(),
        message: format!("{ttl_days} is outside 0..={MAX_TTL_DAYS}"),
    };
    if ttl_days == 0 {
        return Ok(None);
    }
    if !(1..=MAX_TTL_DAYS).contains(&ttl_days) {
        return Err(invalid());
    }
    Duration::try_days(ttl_days)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .map(Some)
        .ok_or_else(invalid)
}

/// A stored invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub digest: String,
    pub created_by: String,
    pub max_uses: u32,
    pub uses: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Result of checking a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CodeStatus {
    Valid { remaining_uses: u32 },
    Unknown,
    Expired,
    Exhausted,
}

impl CodeStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, CodeStatus::Valid { .. })
    }
}

impl Invitation {
    pub fn new(
        code: &str,
        created_by: impl Into<String>,
        max_uses: u32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            digest: code_digest(code),
            created_by: created_by.into(),
            max_uses,
            uses: 0,
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Status of this invitation at `now`. Expiry is checked before use count.
    pub fn status(&self, now: DateTime<Utc>) -> CodeStatus {
        if self.expires_at.is_some_and(|exp| now >= exp) {
            return CodeStatus::Expired;
        }
        if self.uses >= self.max_uses {
            return CodeStatus::Exhausted;
        }
        CodeStatus::Valid {
            remaining_uses: self.max_uses - self.uses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;

    #[test]
    fn test_generated_code_shape() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let code = generate_code(&mut rng);
        assert_eq!(code.len(), CODE_LEN + 1);
        assert_eq!(&code[4..5], "-");
        assert!(normalize_code(&code)
            .bytes()
            .all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_digest_ignores_formatting() {
        assert_eq!(code_digest("abcd-efgh"), code_digest(" ABCDEFGH "));
        assert_ne!(code_digest("ABCDEFGH"), code_digest("ABCDEFGJ"));
        assert_eq!(code_digest("x").len(), 64);
    }

    #[test]
    fn test_status_transitions() {
        let now = Utc::now();
        let mut inv = Invitation::new("ABCD-EFGH", "admin", 2, Some(now + Duration::days(1)));
        assert_eq!(inv.status(now), CodeStatus::Valid { remaining_uses: 2 });

        inv.uses = 2;
        assert_eq!(inv.status(now), CodeStatus::Exhausted);

        assert_eq!(inv.status(now + Duration::days(2)), CodeStatus::Expired);
    }

    #[test]
    fn test_expiry_after_bounds() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, 0).unwrap(), None);
        assert_eq!(expiry_after(now, 14).unwrap(), Some(now + Duration::days(14)));
        assert!(expiry_after(now, -1).is_err());
        assert!(expiry_after(now, MAX_TTL_DAYS + 1).is_err());
        assert!(expiry_after(now, i64::MAX).is_err());
        assert!(expiry_after(DateTime::<Utc>::MAX_UTC, 1).is_err());
    }

    #[test]
    fn test_no_expiry() {
        let inv = Invitation::new("ABCD-EFGH", "admin", 1, None);
        assert!(inv.status(Utc::now() + Duration::days(3650)).is_valid());
    }
}
