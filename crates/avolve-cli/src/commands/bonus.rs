use avolve_core::rewards::{apply_streak_bonus, streak_bonus_multiplier};
use clap::Args;
use serde::Serialize;

#[derive(Args)]
pub struct BonusArgs {
    /// Current streak length (consecutive days)
    #[arg(allow_negative_numbers = true)]
    pub streak: i64,
    /// Base reward to scale by the multiplier
    #[arg(long)]
    pub base: Option<i64>,
}

#[derive(Serialize)]
struct BonusOutput {
    streak: i64,
    multiplier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    awarded: Option<i64>,
}

pub fn run(args: BonusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let output = BonusOutput {
        streak: args.streak,
        multiplier: streak_bonus_multiplier(args.streak),
        base: args.base,
        awarded: args.base.map(|base| apply_streak_bonus(base, args.streak)),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
