//! Token ledger operations.
//!
//! Every write appends to `token_transactions` and adjusts the cached row in
//! `token_balances` inside one SQLite transaction, so the cache never drifts
//! from the entries it summarizes unless the table is edited by hand.
//! [`Database::verify_balances`] detects that case and
//! [`Database::rebuild_balances`] repairs it.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::database::{from_sql_time, to_sql_time, Database};
use crate::error::{CoreError, DatabaseError, LedgerError, ValidationError};
use crate::rewards::{
    apply_streak_bonus, streak_bonus_multiplier, Balances, Recognition, StreakState,
    StreakStatus, StreakUpdate, TokenTransaction, TokenType, TransactionKind,
};

/// Outcome of a streak-boosted reward claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardClaim {
    pub transaction: TokenTransaction,
    pub base_amount: i64,
    pub multiplier: f64,
    pub streak: StreakUpdate,
    pub balance: i64,
}

/// A cached balance that disagrees with the sum of its transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMismatch {
    pub user_id: String,
    pub token: TokenType,
    pub cached: i64,
    pub computed: i64,
}

const TX_COLUMNS: &str =
    "id, user_id, token, kind, amount, reason, counterparty, streak, multiplier, created_at";

/// Transaction row as stored, before enum/timestamp decoding.
struct RawTransaction {
    id: String,
    user_id: String,
    token: String,
    kind: String,
    amount: i64,
    reason: String,
    counterparty: Option<String>,
    streak: Option<i64>,
    multiplier: Option<f64>,
    created_at: String,
}

impl RawTransaction {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            token: row.get(2)?,
            kind: row.get(3)?,
            amount: row.get(4)?,
            reason: row.get(5)?,
            counterparty: row.get(6)?,
            streak: row.get(7)?,
            multiplier: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

impl TryFrom<RawTransaction> for TokenTransaction {
    type Error = DatabaseError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            table: "token_transactions".into(),
            message,
        };
        let token = raw
            .token
            .parse::<TokenType>()
            .map_err(|e| corrupt(e.to_string()))?;
        let kind = TransactionKind::parse(&raw.kind)
            .ok_or_else(|| corrupt(format!("unknown kind '{}'", raw.kind)))?;

        Ok(TokenTransaction {
            id: raw.id,
            user_id: raw.user_id,
            token,
            kind,
            amount: raw.amount,
            reason: raw.reason,
            counterparty: raw.counterparty,
            streak: raw.streak,
            multiplier: raw.multiplier,
            created_at: from_sql_time("token_transactions", &raw.created_at)?,
        })
    }
}

fn insert_transaction(conn: &Connection, tx: &TokenTransaction) -> Result<(), CoreError> {
    conn.execute(
        "INSERT INTO token_transactions
            (id, user_id, token, kind, amount, reason, counterparty, streak, multiplier, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            tx.id,
            tx.user_id,
            tx.token.as_str(),
            tx.kind.as_str(),
            tx.amount,
            tx.reason,
            tx.counterparty,
            tx.streak,
            tx.multiplier,
            to_sql_time(tx.created_at),
        ],
    )?;
    Ok(())
}

fn cached_balance(conn: &Connection, user_id: &str, token: TokenType) -> Result<i64, CoreError> {
    let balance = conn
        .query_row(
            "SELECT balance FROM token_balances WHERE user_id = ?1 AND token = ?2",
            params![user_id, token.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(balance.unwrap_or(0))
}

/// Add `delta` to the cached balance and return the new value.
fn apply_delta(
    conn: &Connection,
    user_id: &str,
    token: TokenType,
    delta: i64,
    at: DateTime<Utc>,
) -> Result<i64, CoreError> {
    let current = cached_balance(conn, user_id, token)?;
    let updated = current
        .checked_add(delta)
        .ok_or_else(|| LedgerError::Overflow {
            user_id: user_id.to_string(),
            token,
        })?;
    conn.execute(
        "INSERT INTO token_balances (user_id, token, balance, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id, token) DO UPDATE SET balance = excluded.balance, updated_at = excluded.updated_at",
        params![user_id, token.as_str(), updated, to_sql_time(at)],
    )?;
    Ok(updated)
}

fn load_streak(conn: &Connection, user_id: &str) -> Result<StreakState, CoreError> {
    let row = conn
        .query_row(
            "SELECT current, best, last_completed_on FROM streaks WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((current, best, last)) = row else {
        return Ok(StreakState::new());
    };

    let last_completed_on = match last {
        Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
            DatabaseError::CorruptRow {
                table: "streaks".into(),
                message: format!("bad date '{raw}': {e}"),
            }
        })?),
        None => None,
    };

    Ok(StreakState {
        current,
        best,
        last_completed_on,
    })
}

fn save_streak(conn: &Connection, user_id: &str, state: &StreakState) -> Result<(), CoreError> {
    conn.execute(
        "INSERT INTO streaks (user_id, current, best, last_completed_on)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
            current = excluded.current,
            best = excluded.best,
            last_completed_on = excluded.last_completed_on",
        params![
            user_id,
            state.current,
            state.best,
            state
                .last_completed_on
                .map(|d| d.format("%Y-%m-%d").to_string()),
        ],
    )?;
    Ok(())
}

/// Append `tx` and update its cached balance. Callers own the SQLite transaction.
pub(crate) fn post(conn: &Connection, tx: &TokenTransaction) -> Result<i64, CoreError> {
    insert_transaction(conn, tx)?;
    apply_delta(conn, &tx.user_id, tx.token, tx.amount, tx.created_at)
}

impl Database {
    /// Append a transaction and return the member's new balance for its token.
    ///
    /// # Errors
    /// Fails if a debit would take the balance below zero.
    pub fn record(&self, tx: &TokenTransaction) -> Result<i64, CoreError> {
        let sql_tx = self.conn.unchecked_transaction()?;
        if tx.amount < 0 {
            let requested = tx.amount.checked_neg().ok_or_else(|| LedgerError::Overflow {
                user_id: tx.user_id.clone(),
                token: tx.token,
            })?;
            let available = cached_balance(&sql_tx, &tx.user_id, tx.token)?;
            if available < requested {
                return Err(LedgerError::InsufficientBalance {
                    user_id: tx.user_id.clone(),
                    token: tx.token,
                    available,
                    requested,
                }
                .into());
            }
        }
        let balance = post(&sql_tx, tx)?;
        sql_tx.commit()?;
        tracing::debug!(
            user_id = %tx.user_id,
            token = %tx.token,
            kind = tx.kind.as_str(),
            amount = tx.amount,
            balance,
            "ledger entry recorded"
        );
        Ok(balance)
    }

    /// Credit a daily-challenge style reward, boosted by the member's streak.
    ///
    /// The completion on `on` is recorded against the streak first; the
    /// multiplier is taken from the updated streak. A second claim on the
    /// same day still pays out at the unchanged streak.
    ///
    /// # Errors
    /// Returns a validation error when `base_amount` is not positive.
    pub fn claim_reward(
        &self,
        user_id: &str,
        token: TokenType,
        base_amount: i64,
        reason: &str,
        on: NaiveDate,
    ) -> Result<RewardClaim, CoreError> {
        if base_amount <= 0 {
            return Err(ValidationError::NonPositiveAmount(base_amount).into());
        }
        if user_id.trim().is_empty() {
            return Err(ValidationError::Empty("user_id".into()).into());
        }

        let sql_tx = self.conn.unchecked_transaction()?;

        let mut state = load_streak(&sql_tx, user_id)?;
        let update = state.record_completion(on);
        let streak = state.current;
        let multiplier = streak_bonus_multiplier(streak);
        let amount = apply_streak_bonus(base_amount, streak);

        let transaction =
            TokenTransaction::new(user_id, token, TransactionKind::Reward, amount, reason)
                .with_bonus(streak, multiplier);
        let balance = post(&sql_tx, &transaction)?;
        save_streak(&sql_tx, user_id, &state)?;
        sql_tx.commit()?;

        if update.broken {
            tracing::info!(user_id, previous = update.before, "streak broken");
        }
        tracing::info!(
            user_id,
            token = %token,
            base_amount,
            streak,
            multiplier,
            amount,
            "reward claimed"
        );

        Ok(RewardClaim {
            transaction,
            base_amount,
            multiplier,
            streak: update,
            balance,
        })
    }

    /// Debit `amount` tokens.
    ///
    /// # Errors
    /// Fails with [`LedgerError::InsufficientBalance`] when the balance is short.
    pub fn spend(
        &self,
        user_id: &str,
        token: TokenType,
        amount: i64,
        reason: &str,
    ) -> Result<TokenTransaction, CoreError> {
        if amount <= 0 {
            return Err(ValidationError::NonPositiveAmount(amount).into());
        }
        let tx = TokenTransaction::new(user_id, token, TransactionKind::Spend, -amount, reason);
        self.record(&tx)?;
        tracing::info!(user_id, token = %token, amount, "tokens spent");
        Ok(tx)
    }

    /// Credit a peer recognition to its recipient.
    ///
    /// # Errors
    /// Fails on malformed requests and when the sender already sent
    /// `daily_limit` recognitions on `now`'s UTC day.
    pub fn recognize(
        &self,
        recognition: &Recognition,
        daily_limit: u32,
        now: DateTime<Utc>,
    ) -> Result<TokenTransaction, CoreError> {
        recognition.validate()?;

        let sql_tx = self.conn.unchecked_transaction()?;
        let sent_today = self.recognitions_sent_on(&sql_tx, &recognition.from, now.date_naive())?;
        if sent_today >= daily_limit {
            tracing::warn!(from = %recognition.from, daily_limit, "recognition limit reached");
            return Err(LedgerError::RecognitionLimit { limit: daily_limit }.into());
        }

        let tx = TokenTransaction::new(
            recognition.to.clone(),
            recognition.token,
            TransactionKind::Recognition,
            recognition.amount,
            recognition.ledger_reason(),
        )
        .with_counterparty(recognition.from.clone())
        .with_created_at(now);
        post(&sql_tx, &tx)?;
        sql_tx.commit()?;

        tracing::info!(
            from = %recognition.from,
            to = %recognition.to,
            token = %recognition.token,
            amount = recognition.amount,
            "recognition credited"
        );
        Ok(tx)
    }

    fn recognitions_sent_on(
        &self,
        conn: &Connection,
        sender: &str,
        day: NaiveDate,
    ) -> Result<u32, CoreError> {
        let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM token_transactions
             WHERE kind = 'recognition' AND counterparty = ?1
               AND created_at >= ?2 AND created_at < ?3",
            params![sender, to_sql_time(start), to_sql_time(end)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Cached balance for one token (0 when the member has none).
    pub fn balance(&self, user_id: &str, token: TokenType) -> Result<i64, CoreError> {
        cached_balance(&self.conn, user_id, token)
    }

    /// Cached balances for every token.
    pub fn balances(&self, user_id: &str) -> Result<Balances, CoreError> {
        let mut balances = Balances::default();
        for token in TokenType::ALL {
            balances.set(token, cached_balance(&self.conn, user_id, token)?);
        }
        Ok(balances)
    }

    /// Most recent transactions first.
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<TokenTransaction>, CoreError> {
        let sql = format!(
            "SELECT {TX_COLUMNS} FROM token_transactions
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], RawTransaction::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|raw| TokenTransaction::try_from(raw).map_err(CoreError::from))
            .collect()
    }

    /// Stored streak counters for a member.
    pub fn streak(&self, user_id: &str) -> Result<StreakState, CoreError> {
        load_streak(&self.conn, user_id)
    }

    /// Streak counters as seen on `today`, with lapsed streaks reading as 0.
    pub fn streak_status(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<StreakStatus, CoreError> {
        Ok(self.streak(user_id)?.status(today))
    }

    /// Compare every cached balance with the sum of its transactions.
    pub fn verify_balances(&self) -> Result<Vec<BalanceMismatch>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, token, SUM(cached), SUM(computed) FROM (
                SELECT user_id, token, balance AS cached, 0 AS computed FROM token_balances
                UNION ALL
                SELECT user_id, token, 0 AS cached, amount AS computed FROM token_transactions
             )
             GROUP BY user_id, token
             HAVING SUM(cached) != SUM(computed)
             ORDER BY user_id, token",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut mismatches = Vec::with_capacity(rows.len());
        for (user_id, token, cached, computed) in rows {
            let token = token.parse::<TokenType>().map_err(|e| DatabaseError::CorruptRow {
                table: "token_balances".into(),
                message: e.to_string(),
            })?;
            tracing::warn!(%user_id, %token, cached, computed, "balance cache mismatch");
            mismatches.push(BalanceMismatch {
                user_id,
                token,
                cached,
                computed,
            });
        }
        Ok(mismatches)
    }

    /// Rewrite the balance cache from the transaction log. Returns rows written.
    pub fn rebuild_balances(&self) -> Result<usize, CoreError> {
        let sql_tx = self.conn.unchecked_transaction()?;
        sql_tx.execute("DELETE FROM token_balances", [])?;
        let written = sql_tx.execute(
            "INSERT INTO token_balances (user_id, token, balance, updated_at)
             SELECT user_id, token, SUM(amount), ?1 FROM token_transactions
             GROUP BY user_id, token",
            [to_sql_time(Utc::now())],
        )?;
        sql_tx.commit()?;
        tracing::info!(rows = written, "balance cache rebuilt");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_claim_applies_streak_bonus() {
        let db = Database::open_memory().unwrap();

        let first = db
            .claim_reward("u1", TokenType::Gen, 100, "daily challenge", day(1))
            .unwrap();
        assert_eq!(first.streak.after, 1);
        assert_eq!(first.transaction.amount, 100);

        db.claim_reward("u1", TokenType::Gen, 100, "daily challenge", day(2))
            .unwrap();
        let third = db
            .claim_reward("u1", TokenType::Gen, 100, "daily challenge", day(3))
            .unwrap();
        assert_eq!(third.streak.after, 3);
        assert_eq!(third.multiplier, 1.3);
        assert_eq!(third.transaction.amount, 130);
        assert_eq!(third.transaction.streak, Some(3));
        assert_eq!(third.balance, 330);
        assert_eq!(db.balance("u1", TokenType::Gen).unwrap(), 330);
    }

    #[test]
    fn test_same_day_claim_keeps_streak() {
        let db = Database::open_memory().unwrap();
        db.claim_reward("u1", TokenType::Sap, 10, "a", day(1)).unwrap();
        let again = db.claim_reward("u1", TokenType::Sap, 10, "b", day(1)).unwrap();
        assert!(!again.streak.counted);
        assert_eq!(again.streak.after, 1);
        assert_eq!(db.streak("u1").unwrap().current, 1);
        assert_eq!(db.balance("u1", TokenType::Sap).unwrap(), 20);
    }

    #[test]
    fn test_claim_rejects_non_positive_base() {
        let db = Database::open_memory().unwrap();
        assert!(matches!(
            db.claim_reward("u1", TokenType::Gen, 0, "x", day(1)),
            Err(CoreError::Validation(ValidationError::NonPositiveAmount(0)))
        ));
        assert_eq!(db.streak("u1").unwrap(), StreakState::new());
    }

    #[test]
    fn test_spend_guards_balance() {
        let db = Database::open_memory().unwrap();
        db.claim_reward("u1", TokenType::Psp, 50, "x", day(1)).unwrap();

        let err = db.spend("u1", TokenType::Psp, 60, "shop").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Ledger(LedgerError::InsufficientBalance {
                available: 50,
                requested: 60,
                ..
            })
        ));

        db.spend("u1", TokenType::Psp, 50, "shop").unwrap();
        assert_eq!(db.balance("u1", TokenType::Psp).unwrap(), 0);
        assert_eq!(db.history("u1", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_balances_cover_all_tokens() {
        let db = Database::open_memory().unwrap();
        db.claim_reward("u1", TokenType::Sap, 7, "x", day(1)).unwrap();
        let b = db.balances("u1").unwrap();
        assert_eq!(b, Balances { gen: 0, sap: 7, psp: 0 });
    }

    #[test]
    fn test_history_is_newest_first_and_limited() {
        let db = Database::open_memory().unwrap();
        for d in 1..=4 {
            db.claim_reward("u1", TokenType::Gen, 10, &format!("day {d}"), day(d))
                .unwrap();
        }
        let history = db.history("u1", 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, "day 4");
        assert_eq!(history[1].reason, "day 3");
    }

    #[test]
    fn test_recognition_daily_limit() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let rec = Recognition {
            from: "alice".into(),
            to: "bob".into(),
            token: TokenType::Sap,
            amount: 5,
            message: "thanks!".into(),
        };

        db.recognize(&rec, 2, now).unwrap();
        db.recognize(&rec, 2, now).unwrap();
        assert!(matches!(
            db.recognize(&rec, 2, now),
            Err(CoreError::Ledger(LedgerError::RecognitionLimit { limit: 2 }))
        ));
        assert_eq!(db.balance("bob", TokenType::Sap).unwrap(), 10);
        assert_eq!(db.balance("alice", TokenType::Sap).unwrap(), 0);

        // A new UTC day resets the allowance.
        db.recognize(&rec, 2, now + Duration::days(1)).unwrap();
        assert_eq!(db.balance("bob", TokenType::Sap).unwrap(), 15);

        let last = &db.history("bob", 1).unwrap()[0];
        assert_eq!(last.counterparty.as_deref(), Some("alice"));
    }

    #[test]
    fn test_verify_and_rebuild_balances() {
        let db = Database::open_memory().unwrap();
        db.claim_reward("u1", TokenType::Gen, 10, "x", day(1)).unwrap();
        db.claim_reward("u2", TokenType::Sap, 20, "x", day(1)).unwrap();
        assert!(db.verify_balances().unwrap().is_empty());

        db.conn()
            .execute(
                "UPDATE token_balances SET balance = 999 WHERE user_id = 'u1'",
                [],
            )
            .unwrap();
        let mismatches = db.verify_balances().unwrap();
        assert_eq!(
            mismatches,
            vec![BalanceMismatch {
                user_id: "u1".into(),
                token: TokenType::Gen,
                cached: 999,
                computed: 10,
            }]
        );

        assert_eq!(db.rebuild_balances().unwrap(), 2);
        assert!(db.verify_balances().unwrap().is_empty());
        assert_eq!(db.balance("u1", TokenType::Gen).unwrap(), 10);
    }

    #[test]
    fn test_record_adjustment() {
        let db = Database::open_memory().unwrap();
        let tx = TokenTransaction::new("u1", TokenType::Gen, TransactionKind::Adjustment, 15, "grant");
        assert_eq!(db.record(&tx).unwrap(), 15);
        let stored = &db.history("u1", 1).unwrap()[0];
        assert_eq!(stored.id, tx.id);
        assert_eq!(stored.kind, TransactionKind::Adjustment);
        assert_eq!(stored.multiplier, None);
    }

    #[test]
    fn test_record_min_amount_is_an_error() {
        let db = Database::open_memory().unwrap();
        db.claim_reward("u1", TokenType::Gen, 10, "x", day(1)).unwrap();
        let tx = TokenTransaction::new("u1", TokenType::Gen, TransactionKind::Adjustment, i64::MIN, "x");
        assert!(matches!(
            db.record(&tx),
            Err(CoreError::Ledger(LedgerError::Overflow { .. }))
        ));
        assert_eq!(db.balance("u1", TokenType::Gen).unwrap(), 10);
        assert_eq!(db.history("u1", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_streak_status_lapses_after_a_missed_day() {
        let db = Database::open_memory().unwrap();
        for d in 1..=3 {
            db.claim_reward("u1", TokenType::Gen, 10, "x", day(d)).unwrap();
        }
        let status = db.streak_status("u1", day(4)).unwrap();
        assert!(status.active);
        assert_eq!(status.effective, 3);

        let status = db.streak_status("u1", day(20)).unwrap();
        assert!(!status.active);
        assert_eq!(status.effective, 0);
        assert_eq!(status.current, 3);
        assert_eq!(status.best, 3);
    }
}
