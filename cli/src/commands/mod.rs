//! CLI commands
//!
//! Each subcommand drives the session manager the way the storefront's
//! login form, logout button and data views do.

pub mod auth;
pub mod fetch;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use teapos_core::Config;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "teapos", about = "TeaPOS storefront client", long_about = None)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "TEAPOS_BACKEND_URL")]
    backend_url: Option<String>,

    /// Directory holding the session database
    #[arg(long, global = true, env = "TEAPOS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login(auth::LoginArgs),
    /// Create an account (does not sign in)
    Register(auth::RegisterArgs),
    /// End the session locally and on the backend
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show whether a session is stored
    Status,
    /// Renew the access token now
    Refresh,
    /// Call an API path with the stored session
    Fetch(fetch::FetchArgs),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.apply_overrides(Config::from_env()?)?;
        let mut state = AppState::new(config)?;

        let result = match self.command {
            Commands::Login(args) => auth::login(&state, args).await,
            Commands::Register(args) => auth::register(&state, args).await,
            Commands::Logout => auth::logout(&state).await,
            Commands::Whoami => auth::whoami(&state),
            Commands::Status => auth::status(&state),
            Commands::Refresh => auth::refresh(&state).await,
            Commands::Fetch(args) => fetch::run(&state, args).await,
        };

        state.report_session_events();
        result
    }

    /// Layer the command line flags over `config`, then validate the result
    fn apply_overrides(&self, mut config: Config) -> anyhow::Result<Config> {
        if let Some(url) = &self.backend_url {
            config = config.with_backend_url(url.clone());
        }
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "teapos",
            "--backend-url",
            "http://10.0.0.2:3000",
            "fetch",
            "/menu",
            "-X",
            "post",
            "-d",
            r#"{"qty":2}"#,
        ])
        .unwrap();

        assert_eq!(cli.backend_url.as_deref(), Some("http://10.0.0.2:3000"));
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.path, "/menu");
                assert_eq!(args.method, "post");
                assert_eq!(args.data.as_deref(), Some(r#"{"qty":2}"#));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_backend_url_flag_wins_over_invalid_config() {
        let cli = Cli::try_parse_from([
            "teapos",
            "--backend-url",
            "http://10.0.0.2:3000",
            "--data-dir",
            "/srv/pos",
            "status",
        ])
        .unwrap();
        let base = Config::new(PathBuf::from("/tmp/teapos")).with_backend_url("localhost");

        let config = cli.apply_overrides(base).unwrap();

        assert_eq!(config.backend_url, "http://10.0.0.2:3000");
        assert_eq!(config.database_path, PathBuf::from("/srv/pos/teapos.db"));
    }

    #[test]
    fn test_invalid_config_is_rejected_without_override() {
        let cli = Cli::try_parse_from(["teapos", "--backend-url", "localhost", "status"]).unwrap();

        assert!(cli.apply_overrides(Config::new(PathBuf::from("/tmp/teapos"))).is_err());
    }

    #[test]
    fn test_parse_register_role() {
        let cli = Cli::try_parse_from([
            "teapos",
            "register",
            "--username",
            "kasir",
            "--fullname",
            "Kasir Satu",
            "--password",
            "rahasia",
            "--whatsapp",
            "628123",
            "--role",
            "employee",
        ])
        .unwrap();

        match cli.command {
            Commands::Register(args) => {
                assert_eq!(args.role, teapos_core::UserRole::Employee);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
