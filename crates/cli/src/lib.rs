pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use joinery_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "joinery",
    about = "Joinery quote pricing operator CLI",
    long_about = "Preview quote pricing and discount escalation, import commission tiers, run migrations, and inspect effective configuration.",
    after_help = "Examples:\n  joinery migrate\n  joinery price --store loja-1 --seller ana --base-value 50000 --discount 0.20\n  joinery tiers --store loja-1 --role seller --file tiers.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Dry-run price a quote against the store configuration")]
    Price(commands::price::PriceArgs),
    #[command(about = "Preview the approval level a discount would require")]
    Discount(commands::discount::DiscountArgs),
    #[command(about = "Validate and import a commission tier table for one store and role")]
    Tiers(commands::tiers::TiersArgs),
}

/// Logs go to stderr so stdout carries only the JSON command payload.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands report config failures themselves; logging falls back to defaults.
    let logging_config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&logging_config);

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Price(args) => commands::price::run(args),
        Command::Discount(args) => commands::discount::run(args),
        Command::Tiers(args) => commands::tiers::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
