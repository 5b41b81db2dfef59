use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod cli;

use cli::auth::AuthCommands;

#[derive(Parser)]
#[command(name = "streamline")]
#[command(about = "Streamline CLI - sign in to Twitch from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and out of Twitch
    #[command(subcommand)]
    Auth(AuthCommands),
}

#[tokio::main]
async fn main() {
    streamline_cli::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Auth(command) => command.execute().await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_login_json() {
        let cli = Cli::try_parse_from(["streamline", "auth", "login", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth(AuthCommands::Login { json: true })
        ));
    }
}
