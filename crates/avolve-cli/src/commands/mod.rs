pub mod bonus;
pub mod config;
pub mod invite;
pub mod onboarding;
pub mod recognize;
pub mod reward;
