//! Invitation code storage.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::database::{from_sql_time, to_sql_time, Database};
use crate::error::{CoreError, ValidationError};
use crate::invitation::{code_digest, CodeStatus, Invitation};

impl Database {
    /// Store a new invitation for `code`.
    ///
    /// # Errors
    /// Fails if `max_uses` is zero or the code already exists.
    pub fn create_invitation(
        &self,
        code: &str,
        created_by: &str,
        max_uses: u32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Invitation, CoreError> {
        if max_uses == 0 {
            return Err(ValidationError::InvalidValue {
                field: "max_uses".into(),
                message: "must be at least 1".into(),
            }
            .into());
        }
        let invitation = Invitation::new(code, created_by, max_uses, expires_at);
        self.conn.execute(
            "INSERT INTO invitations (digest, created_by, max_uses, uses, expires_at, created_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5)",
            params![
                invitation.digest,
                invitation.created_by,
                invitation.max_uses,
                invitation.expires_at.map(to_sql_time),
                to_sql_time(invitation.created_at),
            ],
        )?;
        tracing::info!(created_by, max_uses, "invitation created");
        Ok(invitation)
    }

    /// Look up an invitation by its plain code.
    pub fn invitation(&self, code: &str) -> Result<Option<Invitation>, CoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT digest, created_by, max_uses, uses, expires_at, created_at
                 FROM invitations WHERE digest = ?1",
                [code_digest(code)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((digest, created_by, max_uses, uses, expires_at, created_at)) = row else {
            return Ok(None);
        };
        Ok(Some(Invitation {
            digest,
            created_by,
            max_uses,
            uses,
            expires_at: expires_at
                .map(|raw| from_sql_time("invitations", &raw))
                .transpose()?,
            created_at: from_sql_time("invitations", &created_at)?,
        }))
    }

    /// Status of `code` at `now` without consuming a use.
    pub fn check_invitation(&self, code: &str, now: DateTime<Utc>) -> Result<CodeStatus, CoreError> {
        Ok(self
            .invitation(code)?
            .map_or(CodeStatus::Unknown, |inv| inv.status(now)))
    }

    /// Consume one use of `code` if it is valid at `now`.
    ///
    /// Returns the status after redemption; non-valid statuses leave the
    /// invitation untouched.
    pub fn redeem_invitation(&self, code: &str, now: DateTime<Utc>) -> Result<CodeStatus, CoreError> {
        let sql_tx = self.conn.unchecked_transaction()?;
        let status = self.check_invitation(code, now)?;
        if !status.is_valid() {
            tracing::debug!(?status, "invitation not redeemable");
            return Ok(status);
        }

        sql_tx.execute(
            "UPDATE invitations SET uses = uses + 1 WHERE digest = ?1 AND uses < max_uses",
            [code_digest(code)],
        )?;
        let after = self.check_invitation(code, now)?;
        sql_tx.commit()?;
        tracing::info!(?after, "invitation redeemed");

        Ok(match after {
            CodeStatus::Exhausted => CodeStatus::Valid { remaining_uses: 0 },
            other => other,
        })
    }
}
