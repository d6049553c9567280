pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "careline",
    about = "Careline operator CLI",
    long_about = "Run the customer-service analysis pipeline from the terminal and inspect runtime readiness.",
    after_help = "Examples:\n  careline chat --message \"where is my order?\"\n  careline config\n  careline doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one message through the analysis pipeline and print the JSON result")]
    Chat {
        #[arg(long, help = "Customer message to analyze")]
        message: String,
        #[arg(long, help = "JSON file containing prior conversation turns")]
        history_file: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Validate config, prompt templates, and provider reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { message, history_file } => commands::chat::run(message, history_file),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
