use avolve_core::{Config, Database, Recognition, TokenType};
use chrono::Utc;
use clap::Args;

#[derive(Args)]
pub struct RecognizeArgs {
    /// Sender member id
    pub from: String,
    /// Recipient member id
    pub to: String,
    /// Why the recipient is being recognized
    pub message: String,
    /// Token to credit
    #[arg(long, default_value = "SAP")]
    pub token: TokenType,
    /// Amount to credit (defaults to recognition.amount)
    #[arg(long)]
    pub amount: Option<i64>,
}

pub fn run(args: RecognizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    let recognition = Recognition {
        from: args.from,
        to: args.to,
        token: args.token,
        amount: args.amount.unwrap_or(config.recognition.amount),
        message: args.message,
    };
    let tx = db.recognize(&recognition, config.recognition.daily_limit, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&tx)?);
    Ok(())
}
