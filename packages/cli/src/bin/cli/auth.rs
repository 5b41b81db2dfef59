// ABOUTME: CLI commands for Twitch sign-in and sign-out
// ABOUTME: Runs the browser flow, shows the signed-in profile, and revokes the token on exit

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use streamline_auth::{AuthError, SessionConfig, SessionManager, SignInOutcome, User};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with Twitch, show your profile, and sign out when you are done
    Login {
        /// Print the profile as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print an authorization URL without opening the browser
    Url,
}

impl AuthCommands {
    pub async fn execute(&self) -> Result<()> {
        match self {
            AuthCommands::Login { json } => login_command(*json).await,
            AuthCommands::Url => url_command(),
        }
    }
}

fn load_manager() -> Result<SessionManager> {
    let config = SessionConfig::from_env().context("Failed to load configuration")?;
    SessionManager::from_config(config).context("Failed to initialize session manager")
}

async fn login_command(json: bool) -> Result<()> {
    let manager = load_manager()?;

    println!("{}", "🔐 Signing in with Twitch...".bold().cyan());
    println!("   Your browser will open. Press Ctrl-C to cancel.");
    println!();

    let user = match manager.sign_in().await {
        Ok(SignInOutcome::SignedIn(user)) => user,
        Ok(SignInOutcome::Cancelled) => {
            println!("{} Sign-in cancelled", "✗".yellow().bold());
            return Ok(());
        }
        Err(AuthError::InvalidState) => {
            bail!("Sign-in rejected: the redirect did not belong to this request")
        }
        Err(e) => return Err(e.into()),
    };

    println!("{} Signed in", "✓".green().bold());
    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("{}", profile_table(&user));
    }

    println!();
    println!("Press {} or {} to sign out.", "Enter".yellow(), "Ctrl-C".yellow());
    wait_for_exit().await;

    println!("{}", "🔓 Signing out...".bold().cyan());
    manager.sign_out().await;
    println!("{} Signed out", "✓".green().bold());
    Ok(())
}

fn url_command() -> Result<()> {
    let manager = load_manager()?;
    let request = manager.authorization_request();
    let url = request.to_url(manager.config().endpoints.authorize_url());

    println!("{}", url);
    println!();
    println!("State: {}", request.state.dimmed());
    Ok(())
}

fn profile_table(user: &User) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["ID", user.id.as_str()]);
    table.add_row(vec!["Name", user.display_name.as_str()]);
    table.add_row(vec![
        "Email",
        if user.email.is_empty() {
            "(not shared)"
        } else {
            user.email.as_str()
        },
    ]);
    table.add_row(vec!["Avatar", user.avatar_url.as_str()]);
    table
}

async fn wait_for_exit() {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tokio::select! {
        _ = lines.next_line() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_table_hides_empty_email() {
        let user = User {
            id: "1".to_string(),
            display_name: "Foo".to_string(),
            email: String::new(),
            avatar_url: "http://img".to_string(),
        };
        let rendered = profile_table(&user).to_string();
        assert!(rendered.contains("Foo"));
        assert!(rendered.contains("(not shared)"));
    }
}
