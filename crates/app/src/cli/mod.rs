pub mod config;
pub mod session;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use lv_domain::config::Config;

/// Session lifecycle for the Lovent event client.
#[derive(Debug, Parser)]
#[command(name = "lovent", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a new session after a successful login.
    Login(LoginArgs),
    /// Decide the cold-start route (auto_login, resume or login).
    Start,
    /// Print the logged-in user.  Exits with code 1 when logged out.
    Whoami {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print session timing without evaluating expiry.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Refresh the session, as on app resume.
    Resume,
    /// Clear the stored session.
    Logout,
    /// Turn off auto-login but keep the current session.
    ForgetMe,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Authenticator response (JSON file) holding the user object.
    #[arg(long, conflicts_with_all = ["user_id", "name", "email", "photo_url", "token"])]
    pub payload: Option<PathBuf>,
    /// User identifier.
    #[arg(long, required_unless_present = "payload")]
    pub user_id: Option<String>,
    /// Display name.
    #[arg(long, required_unless_present = "payload")]
    pub name: Option<String>,
    /// Email address.
    #[arg(long, required_unless_present = "payload")]
    pub email: Option<String>,
    /// Profile photo URL.
    #[arg(long)]
    pub photo_url: Option<String>,
    /// Auto-login token.
    #[arg(long)]
    pub token: Option<String>,
    /// Keep the session past the inactivity window and allow auto-login.
    #[arg(long)]
    pub remember_me: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `LOVENT_CONFIG` (or
/// `lovent.toml` by default).  Returns the parsed [`Config`] and the path
/// that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("LOVENT_CONFIG").unwrap_or_else(|_| "lovent.toml".into());
    let config = Config::load_or_default(std::path::Path::new(&config_path))
        .map_err(|e| anyhow::anyhow!("loading {config_path}: {e}"))?;
    Ok((config, config_path))
}
