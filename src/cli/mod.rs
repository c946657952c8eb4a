//! CLI entry point for keyward.

pub mod auth;

use clap::{Parser, Subcommand};

/// keyward CLI
#[derive(Parser, Debug)]
#[command(name = "keyward", version, about = "Session token tooling for the admin backend")]
pub struct Cli {
    /// Backend base URL (overrides KEYWARD_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log output format
    #[arg(long, global = true, default_value = "compact")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    Pretty,
    Json,
    #[default]
    Compact,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in and store the credential pair
    Login(LoginArgs),
    /// Check the stored session against the backend (refreshing if needed)
    Status,
    /// Show the signed-in user's profile
    Whoami,
    /// Forget the stored credentials
    Logout,
}

/// Arguments for `keyward auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account e-mail
    pub username: String,

    /// Password (prompted for when omitted)
    #[arg(long, env = "KEYWARD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_login_with_password_flag() {
        let cli = Cli::try_parse_from([
            "keyward",
            "auth",
            "login",
            "admin@example.com",
            "--password",
            "secret1",
        ])
        .unwrap();
        match cli.command {
            Commands::Auth(AuthArgs {
                command: AuthCommands::Login(args),
            }) => {
                assert_eq!(args.username, "admin@example.com");
                assert_eq!(args.password.as_deref(), Some("secret1"));
            }
            other => panic!("expected login, got {other:?}"),
        }
    }

    #[test]
    fn global_base_url_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "keyward",
            "auth",
            "status",
            "--base-url",
            "http://localhost:9000",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:9000"));
        assert!(matches!(
            cli.command,
            Commands::Auth(AuthArgs {
                command: AuthCommands::Status
            })
        ));
    }
}
