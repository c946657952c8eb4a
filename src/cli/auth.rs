//! CLI auth command handlers.

use std::io::Write;
use std::sync::Arc;

use crate::auth::{
    AuthCheck, AuthError, AuthService, FileCredentialStore, HttpProfileFetcher, InvalidReason,
    Navigation, SessionStatus, TokenAuthenticator,
};
use crate::config::KeywardConfig;

fn service(config: &KeywardConfig) -> AuthService {
    let store = Arc::new(FileCredentialStore::new(config.credentials_dir.clone()));
    let authenticator = Arc::new(TokenAuthenticator::new(store.clone(), config));
    let profile = Arc::new(HttpProfileFetcher::new(store, config));
    AuthService::new(authenticator, profile)
}

/// Handle `keyward auth login <username>`.
pub async fn handle_login(
    config: &KeywardConfig,
    username: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    match service(config).login(username, &password).await {
        Ok(_) => {
            println!("✅ Logged in as {username}");
            Ok(())
        }
        Err(AuthError::InvalidCredentials) => {
            eprintln!("❌ Invalid username or password");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

/// Handle `keyward auth status`.
pub async fn handle_status(config: &KeywardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let status = service(config).status().await?;
    println!("🔐 {}", describe_status(&status));
    if !matches!(status, SessionStatus::Checked(ref check) if check.is_authenticated()) {
        std::process::exit(1);
    }
    Ok(())
}

/// Handle `keyward auth whoami`.
pub async fn handle_whoami(config: &KeywardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let profile = service(config).current_profile().await?;
    println!("👤 role: {}", profile.role());
    if let Some(email) = &profile.current_user.email {
        println!("   email: {email}");
    }
    Ok(())
}

/// Handle `keyward auth logout`.
pub async fn handle_logout(config: &KeywardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let Navigation::FullReload { path } = service(config).logout()?;
    println!("✅ Logged out (next: {path})");
    Ok(())
}

fn describe_status(status: &SessionStatus) -> String {
    match status {
        SessionStatus::LoggedOut => "Not logged in".to_string(),
        SessionStatus::Checked(AuthCheck::Valid) => "Logged in".to_string(),
        SessionStatus::Checked(AuthCheck::RefreshedAndValid) => {
            "Logged in (access token refreshed)".to_string()
        }
        SessionStatus::Checked(AuthCheck::Invalid(reason)) => match reason {
            InvalidReason::NoAccessToken => "Not logged in".to_string(),
            InvalidReason::MissingRefreshToken => {
                "Session expired and no refresh token is stored; log in again".to_string()
            }
            InvalidReason::RefreshRejected { status } => {
                format!("Session expired; refresh token rejected ({status}); log in again")
            }
            InvalidReason::RefreshFailed { status } => {
                format!("Session expired; refresh failed with {status}, try again later")
            }
            InvalidReason::ProbeStatus(status) => format!("Backend answered {status}"),
            InvalidReason::RefreshLimitReached => {
                "Refreshed token was rejected too; log in again".to_string()
            }
            InvalidReason::Transport(err) => format!("Backend unreachable: {err}"),
            InvalidReason::Storage(err) => format!("Credential store error: {err}"),
        },
    }
}

fn prompt_password() -> Result<String, std::io::Error> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_refresh_rejection() {
        let status = SessionStatus::Checked(AuthCheck::Invalid(InvalidReason::RefreshRejected {
            status: 401,
        }));
        assert!(describe_status(&status).contains("log in again"));
    }
}
