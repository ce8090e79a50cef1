pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cartwise",
    about = "Cartwise operator CLI",
    long_about = "Inspect configuration, prepare the database, and run association-rule mining and basket recommendations against the stored order history.",
    after_help = "Examples:\n  cartwise doctor --json\n  cartwise seed\n  cartwise mine --min-support 0.1\n  cartwise recommend itm-bagel"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog and order history")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity, and order history readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Mine frequent itemsets and rules from delivered orders")]
    Mine {
        #[arg(long, help = "Override mining.min_support for this run")]
        min_support: Option<f64>,
        #[arg(long, help = "Override mining.min_confidence for this run")]
        min_confidence: Option<f64>,
    },
    #[command(about = "Recommend items for a basket of item ids or names")]
    Recommend {
        #[arg(required = true, num_args = 1.., help = "Basket items, by id or display name")]
        items: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Mine { min_support, min_confidence } => {
            commands::mine::run(commands::mine::MineArgs { min_support, min_confidence })
        }
        Command::Recommend { items } => commands::recommend::run(&items),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
