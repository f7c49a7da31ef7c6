//! Session commands
use anyhow::{bail, Context};
use clap::Args;

use teapos_core::{Credentials, RefreshOutcome, Registration, UserRole};

use crate::state::AppState;

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub username: String,

    /// Read from TEAPOS_PASSWORD when not given
    #[arg(long, env = "TEAPOS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub fullname: String,

    /// Read from TEAPOS_PASSWORD when not given
    #[arg(long, env = "TEAPOS_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// WhatsApp number
    #[arg(long)]
    pub whatsapp: String,

    /// superadmin, admin, user or employee
    #[arg(long, default_value = "user")]
    pub role: UserRole,
}

pub async fn login(state: &AppState, args: LoginArgs) -> anyhow::Result<()> {
    let credentials = Credentials::new(args.username, args.password);
    let user = state
        .session_manager()
        .login(&credentials)
        .await
        .context("login failed")?;

    println!("Logged in as {} ({})", user.fullname, user.role);
    Ok(())
}

pub async fn register(state: &AppState, args: RegisterArgs) -> anyhow::Result<()> {
    let registration = Registration::new(args.username, args.fullname, args.password, args.whatsapp)
        .with_role(args.role);
    let user = state
        .session_manager()
        .register(&registration)
        .await
        .context("registration failed")?;

    println!("Registered {} as {}. Run `teapos login` to sign in.", user.username, user.role);
    Ok(())
}

pub async fn logout(state: &AppState) -> anyhow::Result<()> {
    state.session_manager().logout().await;
    println!("Logged out");
    Ok(())
}

pub fn whoami(state: &AppState) -> anyhow::Result<()> {
    match state.session_manager().current_user() {
        Some(user) => {
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(())
        }
        None => bail!("not logged in"),
    }
}

pub fn status(state: &AppState) -> anyhow::Result<()> {
    let manager = state.session_manager();
    let config = state.storefront().config();

    println!("backend:  {}", config.backend_url);
    println!("database: {}", config.database_path.display());
    if manager.is_authenticated() {
        let who = manager
            .current_user()
            .map(|user| user.username)
            .unwrap_or_else(|| "unknown user".to_string());
        println!("session:  signed in as {}", who);
    } else {
        println!("session:  signed out");
    }
    Ok(())
}

pub async fn refresh(state: &AppState) -> anyhow::Result<()> {
    match state.session_manager().refresh_token().await {
        RefreshOutcome::Refreshed(_) => {
            println!("Access token renewed");
            Ok(())
        }
        RefreshOutcome::NoRefreshTokenAvailable => bail!("no session to refresh, log in first"),
        RefreshOutcome::RefreshRejected => bail!("the backend refused to renew the session"),
    }
}
