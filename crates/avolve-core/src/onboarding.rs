//! Onboarding checklist for new members.
//!
//! This module provides:
//! - The ordered list of onboarding steps
//! - Completion gating: a step unlocks only after every earlier step
//! - Per-step GEN rewards taken from [`OnboardingConfig`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::OnboardingError;
use crate::storage::config::OnboardingConfig;

/// A step in the onboarding checklist, in completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    CreateProfile,
    AcceptAgreement,
    SelectJourney,
    CompleteFirstChallenge,
    RecognizePeer,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 5] = [
        OnboardingStep::CreateProfile,
        OnboardingStep::AcceptAgreement,
        OnboardingStep::SelectJourney,
        OnboardingStep::CompleteFirstChallenge,
        OnboardingStep::RecognizePeer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStep::CreateProfile => "create_profile",
            OnboardingStep::AcceptAgreement => "accept_agreement",
            OnboardingStep::SelectJourney => "select_journey",
            OnboardingStep::CompleteFirstChallenge => "complete_first_challenge",
            OnboardingStep::RecognizePeer => "recognize_peer",
        }
    }

    /// Position in the checklist, starting at 0.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    /// Steps that must be complete before this one.
    pub fn prerequisites(&self) -> &'static [OnboardingStep] {
        static ORDER: [OnboardingStep; 5] = OnboardingStep::ALL;
        &ORDER[..self.index()]
    }

    /// GEN tokens granted for completing this step.
    pub fn reward(&self, config: &OnboardingConfig) -> i64 {
        match self {
            OnboardingStep::CreateProfile => config.create_profile_reward,
            OnboardingStep::AcceptAgreement => config.accept_agreement_reward,
            OnboardingStep::SelectJourney => config.select_journey_reward,
            OnboardingStep::CompleteFirstChallenge => config.complete_first_challenge_reward,
            OnboardingStep::RecognizePeer => config.recognize_peer_reward,
        }
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnboardingStep {
    type Err = OnboardingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.as_str() == wanted)
            .ok_or_else(|| OnboardingError::UnknownStep(s.to_string()))
    }
}

/// Outcome of a completion attempt that passed gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Newly completed; `reward` GEN should be credited.
    Completed { reward: i64 },
    /// Already done earlier; nothing to credit.
    AlreadyCompleted,
}

/// One member's progress through the checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProgress {
    pub user_id: String,
    pub completed: BTreeMap<OnboardingStep, DateTime<Utc>>,
}

impl OnboardingProgress {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            completed: BTreeMap::new(),
        }
    }

    pub fn is_completed(&self, step: OnboardingStep) -> bool {
        self.completed.contains_key(&step)
    }

    /// Mark `step` complete at `at`, enforcing checklist order.
    ///
    /// # Errors
    /// Returns [`OnboardingError::OutOfOrder`] naming the first incomplete
    /// prerequisite.
    pub fn complete(
        &mut self,
        step: OnboardingStep,
        at: DateTime<Utc>,
        config: &OnboardingConfig,
    ) -> Result<StepOutcome, OnboardingError> {
        if self.is_completed(step) {
            return Ok(StepOutcome::AlreadyCompleted);
        }

        if let Some(missing) = step
            .prerequisites()
            .iter()
            .copied()
            .find(|p| !self.is_completed(*p))
        {
            return Err(OnboardingError::OutOfOrder { step, missing });
        }

        self.completed.insert(step, at);
        Ok(StepOutcome::Completed {
            reward: step.reward(config),
        })
    }

    /// First step not yet completed, or `None` when done.
    pub fn next_step(&self) -> Option<OnboardingStep> {
        OnboardingStep::ALL
            .iter()
            .copied()
            .find(|s| !self.is_completed(*s))
    }

    pub fn is_complete(&self) -> bool {
        self.next_step().is_none()
    }

    /// Whole-number percentage of steps done (0..=100).
    pub fn percent_complete(&self) -> u8 {
        let done = OnboardingStep::ALL
            .iter()
            .filter(|s| self.is_completed(**s))
            .count();
        ((done * 100) / OnboardingStep::ALL.len()) as u8
    }

    /// JSON-friendly snapshot for display.
    pub fn summary(&self) -> OnboardingSummary {
        OnboardingSummary {
            user_id: self.user_id.clone(),
            percent_complete: self.percent_complete(),
            next_step: self.next_step(),
            steps: OnboardingStep::ALL
                .iter()
                .map(|s| StepStatus {
                    step: *s,
                    completed_at: self.completed.get(s).copied(),
                })
                .collect(),
        }
    }
}

/// Completion state of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepStatus {
    pub step: OnboardingStep,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Snapshot of a member's onboarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingSummary {
    pub user_id: String,
    pub percent_complete: u8,
    pub next_step: Option<OnboardingStep>,
    pub steps: Vec<StepStatus>,
}
