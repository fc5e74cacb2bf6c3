use std::collections::{HashMap, VecDeque};

use avolve_core::invitation::{expiry_after, new_code};
use avolve_core::storage::data_dir;
use avolve_core::{CodeStatus, Config, Database, RateDecision, RateLimiter};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;

const LIMITER_FILE: &str = "invite_attempts.json";

#[derive(Subcommand)]
pub enum InviteAction {
    /// Create a new invitation code
    Create {
        /// Member creating the invitation
        created_by: String,
        /// Number of redemptions allowed (defaults to invitations.default_max_uses)
        #[arg(long)]
        max_uses: Option<u32>,
        /// Days until expiry, 0 for none (defaults to invitations.default_ttl_days)
        #[arg(long)]
        ttl_days: Option<i64>,
    },
    /// Check whether a code is valid without using it
    Check {
        code: String,
        /// Caller identifier the rate limit applies to
        #[arg(long, default_value = "local")]
        client: String,
    },
    /// Redeem one use of a code
    Redeem {
        code: String,
        #[arg(long, default_value = "local")]
        client: String,
    },
}

#[derive(Serialize)]
struct CheckOutput {
    rate_limit: RateDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<CodeStatus>,
}

fn load_limiter(config: &Config) -> Result<RateLimiter, Box<dyn std::error::Error>> {
    let mut limiter = RateLimiter::from_config(&config.rate_limit)?;
    let path = data_dir()?.join(LIMITER_FILE);
    if let Ok(content) = std::fs::read_to_string(&path) {
        match serde_json::from_str::<HashMap<String, VecDeque<DateTime<Utc>>>>(&content) {
            Ok(saved) => limiter.restore(saved),
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable rate limit state"),
        }
    }
    Ok(limiter)
}

fn save_limiter(limiter: &mut RateLimiter, now: DateTime<Utc>) -> Result<(), Box<dyn std::error::Error>> {
    limiter.prune(now);
    let path = data_dir()?.join(LIMITER_FILE);
    std::fs::write(path, serde_json::to_string(limiter.snapshot())?)?;
    Ok(())
}

/// Gate a code lookup behind the rate limiter.
fn limited<F>(client: &str, lookup: F) -> Result<CheckOutput, Box<dyn std::error::Error>>
where
    F: FnOnce(DateTime<Utc>) -> Result<CodeStatus, Box<dyn std::error::Error>>,
{
    let config = Config::load()?;
    let now = Utc::now();
    let mut limiter = load_limiter(&config)?;
    let decision = limiter.check(client, now);
    save_limiter(&mut limiter, now)?;

    let status = if decision.is_allowed() {
        Some(lookup(now)?)
    } else {
        None
    };
    Ok(CheckOutput {
        rate_limit: decision,
        status,
    })
}

pub fn run(action: InviteAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        InviteAction::Create {
            created_by,
            max_uses,
            ttl_days,
        } => {
            let config = Config::load()?;
            let db = Database::open()?;
            let max_uses = max_uses.unwrap_or(config.invitations.default_max_uses);
            let ttl_days = ttl_days.unwrap_or(config.invitations.default_ttl_days);
            let expires_at = expiry_after(Utc::now(), ttl_days)?;

            let code = new_code();
            let invitation = db.create_invitation(&code, &created_by, max_uses, expires_at)?;
            let created = serde_json::json!({
                "code": code,
                "max_uses": invitation.max_uses,
                "expires_at": invitation.expires_at,
            });
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        InviteAction::Check { code, client } => {
            let output = limited(&client, |now| {
                Ok(Database::open()?.check_invitation(&code, now)?)
            })?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        InviteAction::Redeem { code, client } => {
            let output = limited(&client, |now| {
                Ok(Database::open()?.redeem_invitation(&code, now)?)
            })?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
