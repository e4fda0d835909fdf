use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fleetdash::config::{ConfigError, FleetConfig};
use fleetdash::{
    ApiError, ContextError, FileTokenStore, HttpIdentityApi, MemoryTokenStore, SessionStore, TokenStore,
    provide_auth, use_auth,
};
use serde::Serialize;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}: {}", .0.error_code(), .0)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "fleetctl", about = "Fleet dashboard session CLI")]
struct Cli {
    #[arg(long, env = "FLEET_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "FLEET_TOKEN_PATH")]
    token_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Resolve the stored token and print the session view as JSON.
    Status,
    /// Print the signed-in user, or `anonymous`.
    Whoami,
    /// Sign in with email and password and print the user as JSON.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FLEET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out locally and invalidate the session server-side.
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(&cli, |key| std::env::var(key).ok())?;

    let tokens: Arc<dyn TokenStore> = match &config.token_path {
        Some(path) => Arc::new(FileTokenStore::new(path)),
        None => {
            tracing::warn!("no token path configured; session will not persist across runs");
            Arc::new(MemoryTokenStore::new())
        }
    };
    let api = Arc::new(HttpIdentityApi::new(&config.api, Arc::clone(&tokens))?);
    let store = SessionStore::mount(tokens, api);

    tracing::debug!(base_url = %config.api.base_url, "session store mounted");
    provide_auth(store, run(cli.command)).await
}

/// The line printed to stderr when a command fails.
fn failure_message(err: &CliError) -> String {
    format!("error: {err}")
}

/// Build config with command-line values taking precedence over `env`.
/// The environment base URL is never parsed when `--base-url` is given.
fn resolve_config<F>(cli: &Cli, env: F) -> Result<FleetConfig, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = FleetConfig::from_lookup(|key| match key {
        "FLEET_API_BASE_URL" => cli.base_url.clone().or_else(|| env(key)),
        _ => env(key),
    })?;
    if let Some(path) = &cli.token_path {
        config.token_path = Some(path.clone());
    }
    Ok(config)
}

async fn run(command: Command) -> Result<(), CliError> {
    let auth = use_auth()?;
    auth.wait_until_ready().await;

    match command {
        Command::Status => print_json(&auth.view()),
        Command::Whoami => {
            match auth.user() {
                Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
                None => println!("anonymous"),
            }
            Ok(())
        }
        Command::Login { email, password } => {
            let user = auth.login(&email, &password).await?;
            print_json(&user)
        }
        Command::Logout => {
            auth.logout().await;
            println!("signed out");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
