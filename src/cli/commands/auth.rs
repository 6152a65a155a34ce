//! Account commands - register, login, logout and whoami.

use crate::{
    cli::{AppContext, Output},
    core::auth::{self, AuthResponse, Registration},
    errors::Result,
};
use clap::Subcommand;
use std::{fs::OpenOptions, io::Write, path::Path};
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Create an account and start a session
    Register {
        username: String,
        email: String,
        #[arg(long, env = "FINANCE_PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Log in and save the token for later commands
    Login {
        username: String,
        #[arg(long, env = "FINANCE_PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the saved token
    Logout,
    /// Show the signed-in user
    Me,
}

fn save_session(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // an older session file keeps its mode on open
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(token.as_bytes())?;
    info!(path = %path.display(), "Saved session token");
    Ok(())
}

fn describe(response: &AuthResponse) -> String {
    format!(
        "✅ Signed in as {} ({}, {})",
        response.username, response.email, response.role
    )
}

pub async fn run(ctx: &AppContext, token: Option<&str>, command: AuthCommand, out: Output) -> Result<()> {
    let db = &ctx.database;
    let session_file = &ctx.config.auth.session_file;

    match command {
        AuthCommand::Register {
            username,
            email,
            password,
            first_name,
            last_name,
        } => {
            let registration = Registration {
                username,
                email,
                password,
                first_name,
                last_name,
            };
            let response = auth::register(db, &ctx.jwt, registration).await?;
            save_session(session_file, &response.access_token)?;
            out.emit(&response, describe)
        }
        AuthCommand::Login { username, password } => {
            let response = auth::login(db, &ctx.jwt, &username, &password).await?;
            save_session(session_file, &response.access_token)?;
            out.emit(&response, describe)
        }
        AuthCommand::Logout => {
            match std::fs::remove_file(session_file) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            out.success("Logged out")
        }
        AuthCommand::Me => {
            let user = ctx.current_user(token).await?;
            out.emit(&user, |u| {
                let name = [u.first_name.as_deref(), u.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    "👤 {} <{}>{}\nRole: {}\nLast login: {}",
                    u.username,
                    u.email,
                    if name.is_empty() { String::new() } else { format!(" ({name})") },
                    u.role,
                    u.last_login
                        .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_save_session_overwrites_token() -> Result<()> {
        let path = std::env::temp_dir()
            .join(format!("finance-portal-session-{}", std::process::id()))
            .join("session.token");
        save_session(&path, "first-token-value")?;
        save_session(&path, "second")?;
        assert_eq!(std::fs::read_to_string(&path)?, "second");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path)?.permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        std::fs::remove_dir_all(path.parent().unwrap())?;
        Ok(())
    }

    #[test]
    fn test_describe_is_plain_text() {
        let response = AuthResponse {
            access_token: "t".to_string(),
            token_type: "Bearer",
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: "USER".to_string(),
        };
        assert_eq!(describe(&response), "✅ Signed in as alice (alice@example.com, USER)");
    }
}
