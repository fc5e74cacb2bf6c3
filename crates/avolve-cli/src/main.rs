use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "avolve-cli", version, about = "Avolve rewards CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the streak bonus multiplier for a streak length
    Bonus(commands::bonus::BonusArgs),
    /// Token ledger: claims, spending, balances
    Reward {
        #[command(subcommand)]
        action: commands::reward::RewardAction,
    },
    /// Recognize another member with tokens
    Recognize(commands::recognize::RecognizeArgs),
    /// Onboarding checklist
    Onboarding {
        #[command(subcommand)]
        action: commands::onboarding::OnboardingAction,
    },
    /// Invitation codes
    Invite {
        #[command(subcommand)]
        action: commands::invite::InviteAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Bonus(args) => commands::bonus::run(args),
        Commands::Reward { action } => commands::reward::run(action),
        Commands::Recognize(args) => commands::recognize::run(args),
        Commands::Onboarding { action } => commands::onboarding::run(action),
        Commands::Invite { action } => commands::invite::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
