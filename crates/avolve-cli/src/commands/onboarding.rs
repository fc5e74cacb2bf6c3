use avolve_core::{Config, Database, OnboardingStep};
use chrono::Utc;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum OnboardingAction {
    /// Show checklist progress
    Status { user: String },
    /// Complete a checklist step
    Complete {
        user: String,
        /// Step id (e.g. create_profile, select_journey)
        step: OnboardingStep,
    },
}

pub fn run(action: OnboardingAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        OnboardingAction::Status { user } => {
            let progress = db.onboarding_progress(&user)?;
            println!("{}", serde_json::to_string_pretty(&progress.summary())?);
        }
        OnboardingAction::Complete { user, step } => {
            let config = Config::load()?;
            let done = db.complete_onboarding_step(&user, step, Utc::now(), &config.onboarding)?;
            println!("{}", serde_json::to_string_pretty(&done)?);
        }
    }
    Ok(())
}
