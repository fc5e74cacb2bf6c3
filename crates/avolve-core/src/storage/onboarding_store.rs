//! Persistence for onboarding checklist progress.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::config::OnboardingConfig;
use super::database::{from_sql_time, to_sql_time, Database};
use super::ledger::post;
use crate::error::{CoreError, DatabaseError};
use crate::onboarding::{OnboardingProgress, OnboardingStep, OnboardingSummary, StepOutcome};
use crate::rewards::{TokenTransaction, TokenType, TransactionKind};

/// Result of completing an onboarding step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingCompletion {
    pub outcome: StepOutcome,
    /// GEN credit for the step, when it was newly completed with a reward.
    pub transaction: Option<TokenTransaction>,
    pub progress: OnboardingSummary,
}

impl Database {
    /// Load a member's checklist progress.
    pub fn onboarding_progress(&self, user_id: &str) -> Result<OnboardingProgress, CoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT step, completed_at FROM onboarding_steps WHERE user_id = ?1")?;
        let rows = stmt
            .query_map([user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut progress = OnboardingProgress::new(user_id);
        for (step, completed_at) in rows {
            let step = step
                .parse::<OnboardingStep>()
                .map_err(|e| DatabaseError::CorruptRow {
                    table: "onboarding_steps".into(),
                    message: e.to_string(),
                })?;
            progress
                .completed
                .insert(step, from_sql_time("onboarding_steps", &completed_at)?);
        }
        Ok(progress)
    }

    /// Complete `step` for a member and credit its GEN reward.
    ///
    /// # Errors
    /// Returns [`crate::error::OnboardingError::OutOfOrder`] when earlier
    /// steps are still open.
    pub fn complete_onboarding_step(
        &self,
        user_id: &str,
        step: OnboardingStep,
        at: DateTime<Utc>,
        config: &OnboardingConfig,
    ) -> Result<OnboardingCompletion, CoreError> {
        let sql_tx = self.conn.unchecked_transaction()?;
        let mut progress = self.onboarding_progress(user_id)?;
        let outcome = progress.complete(step, at, config)?;

        let mut transaction = None;
        if let StepOutcome::Completed { reward } = outcome {
            sql_tx.execute(
                "INSERT INTO onboarding_steps (user_id, step, completed_at) VALUES (?1, ?2, ?3)",
                params![user_id, step.as_str(), to_sql_time(at)],
            )?;
            if reward > 0 {
                let tx = TokenTransaction::new(
                    user_id,
                    TokenType::Gen,
                    TransactionKind::Onboarding,
                    reward,
                    format!("onboarding: {step}"),
                )
                .with_created_at(at);
                post(&sql_tx, &tx)?;
                transaction = Some(tx);
            }
            tracing::info!(user_id, %step, reward, "onboarding step completed");
        }
        sql_tx.commit()?;

        Ok(OnboardingCompletion {
            outcome,
            transaction,
            progress: progress.summary(),
        })
    }
}
