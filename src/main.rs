//! keyward CLI binary entry point.

use clap::Parser;
use keyward::cli::{AuthCommands, Cli, Commands};
use keyward::config::KeywardConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    keyward::cli::init_logging(&cli.log_format);

    let mut config = KeywardConfig::from_env();
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }

    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => {
                keyward::cli::auth::handle_login(&config, &args.username, args.password).await
            }
            AuthCommands::Status => keyward::cli::auth::handle_status(&config).await,
            AuthCommands::Whoami => keyward::cli::auth::handle_whoami(&config).await,
            AuthCommands::Logout => keyward::cli::auth::handle_logout(&config).await,
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
