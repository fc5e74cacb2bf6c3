use avolve_core::{Config, Database, TokenType};
use chrono::{NaiveDate, Utc};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum RewardAction {
    /// Claim a streak-boosted reward for today's completion
    Claim {
        /// Member id
        user: String,
        /// Token to credit (defaults to rewards.default_token)
        #[arg(long)]
        token: Option<TokenType>,
        /// Base amount before the streak bonus (defaults to rewards.daily_challenge_base)
        #[arg(long)]
        base: Option<i64>,
        /// Ledger reason
        #[arg(long, default_value = "daily challenge")]
        reason: String,
        /// Completion date (YYYY-MM-DD, defaults to today UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Spend tokens
    Spend {
        user: String,
        token: TokenType,
        amount: i64,
        #[arg(long, default_value = "spend")]
        reason: String,
    },
    /// Show balances for every token
    Balance { user: String },
    /// Show recent transactions
    History {
        user: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show streak counters and whether the streak is still alive
    Streak {
        user: String,
        /// Day to evaluate the streak on (YYYY-MM-DD, defaults to today UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Compare cached balances against the transaction log
    Verify,
    /// Rebuild cached balances from the transaction log
    Rebuild,
}

pub fn run(action: RewardAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        RewardAction::Claim {
            user,
            token,
            base,
            reason,
            date,
        } => {
            let config = Config::load()?;
            let token = token.unwrap_or(config.rewards.default_token);
            let base = base.unwrap_or(config.rewards.daily_challenge_base);
            let on = date.unwrap_or_else(|| Utc::now().date_naive());
            let claim = db.claim_reward(&user, token, base, &reason, on)?;
            println!("{}", serde_json::to_string_pretty(&claim)?);
        }
        RewardAction::Spend {
            user,
            token,
            amount,
            reason,
        } => {
            let tx = db.spend(&user, token, amount, &reason)?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        RewardAction::Balance { user } => {
            let balances = db.balances(&user)?;
            println!("{}", serde_json::to_string_pretty(&balances)?);
        }
        RewardAction::History { user, limit } => {
            let history = db.history(&user, limit)?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        RewardAction::Streak { user, date } => {
            let today = date.unwrap_or_else(|| Utc::now().date_naive());
            let streak = db.streak_status(&user, today)?;
            println!("{}", serde_json::to_string_pretty(&streak)?);
        }
        RewardAction::Verify => {
            let mismatches = db.verify_balances()?;
            println!("{}", serde_json::to_string_pretty(&mismatches)?);
        }
        RewardAction::Rebuild => {
            let rows = db.rebuild_balances()?;
            let rebuilt = serde_json::json!({ "rebuilt": rows });
            println!("{}", serde_json::to_string_pretty(&rebuilt)?);
        }
    }
    Ok(())
}
