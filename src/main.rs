use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use storefront::AppContext;
use storefront::config::{ConfigError, StorefrontConfig};
use storefront::context::ContextError;
use storefront::feedback::Notice;
use storefront::net::types::{LoginRequest, RegisterRequest, ResetPasswordRequest};
use storefront::routes::Route;
use storefront::session::{AuthError, SessionEvent};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("client setup failed: {0}")]
    Context(#[from] ContextError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("failed to render JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "Embroidery shop API client")]
struct Cli {
    /// Overrides `STOREFRONT_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `STOREFRONT_TOKEN_FILE`.
    #[arg(long)]
    token_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a client path to its route.
    Route { path: String },
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that talk to the backend.
#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Sign in and store the session token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        repeat_password: String,
    },
    /// Confirm a registration from the emailed link or token.
    Confirm {
        /// Raw token or a `/confirm-registration?token=...` link.
        token: String,
    },
    /// Sign out and forget the stored token.
    Logout,
    /// Rotate the stored token.
    Refresh,
    /// Request a password reset email.
    Forgot {
        #[arg(long)]
        email: String,
    },
    /// Set a new password from a reset token or link.
    Reset {
        /// Raw token or a `/reset-password?token=...` link.
        token: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        repeat_password: String,
    },
    /// Show whether a session token is stored.
    Status,
    Catalog(CatalogCommand),
}

#[derive(Args, Debug)]
struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Subcommand, Debug)]
enum CatalogSubcommand {
    Garments,
    Categories,
    Colors,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to load .env");
        }
    }

    match try_main(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Auth(error)) => {
            report_auth_error(&error);
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main(cli: Cli) -> Result<(), CliError> {
    let command = match cli.command {
        Command::Route { path } => {
            println!("{:?}", Route::parse(&path));
            return Ok(());
        }
        Command::Session(command) => command,
    };

    let mut config = StorefrontConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_owned();
    }
    if let Some(token_file) = cli.token_file {
        config.token_file = token_file;
    }

    let ctx = AppContext::from_config(config)?;
    let mut events = ctx.auth.events();
    let result = run(&ctx, command).await;
    drain_events(&mut events);
    result
}

async fn run(ctx: &AppContext, command: SessionCommand) -> Result<(), CliError> {
    match command {
        SessionCommand::Login { username, password } => {
            ctx.auth.login(&LoginRequest { username, password }).await?;
            announce("Signed in");
        }
        SessionCommand::Register { username, email, password, repeat_password } => {
            ctx.auth
                .register(&RegisterRequest { username, email, password, repeat_password })
                .await?;
            announce("Registration received, check your email to confirm");
        }
        SessionCommand::Confirm { token } => {
            ctx.auth.confirm_registration(&extract_token(&token)).await?;
            announce("Email confirmed, you can sign in now");
        }
        SessionCommand::Logout => {
            ctx.auth.logout().await?;
            announce("See you soon!");
        }
        SessionCommand::Refresh => {
            ctx.auth.refresh().await?;
            announce("Session refreshed");
        }
        SessionCommand::Forgot { email } => {
            ctx.auth.forgot_password(&email).await?;
            println!("{}", Route::PasswordResetSent);
            announce("If the address is registered, a reset link is on its way");
        }
        SessionCommand::Reset { token, password, repeat_password } => {
            let token = extract_token(&token);
            ctx.auth
                .reset_password(&ResetPasswordRequest { token, password, repeat_password })
                .await?;
            announce("Password changed, sign in with the new password");
        }
        SessionCommand::Status => {
            let state = if ctx.auth.is_authenticated() { "signed in" } else { "signed out" };
            println!("{state}");
        }
        SessionCommand::Catalog(catalog) => match catalog.command {
            CatalogSubcommand::Garments => print_json(&ctx.catalog.garments().await?)?,
            CatalogSubcommand::Categories => print_json(&ctx.catalog.categories().await?)?,
            CatalogSubcommand::Colors => print_json(&ctx.catalog.colors().await?)?,
        },
    }
    Ok(())
}

/// Accept either a bare token or a link carrying `?token=`.
fn extract_token(raw: &str) -> String {
    let path = raw.find('/').map_or(raw, |idx| &raw[idx..]);
    match Route::parse(path) {
        Route::ResetPassword { token: Some(token) } | Route::ConfirmRegistration { token: Some(token) } => token,
        _ => raw.to_owned(),
    }
}

fn announce(message: &str) {
    let notice = Notice::success(Some(message));
    eprintln!("{}: {}", notice.title, notice.description);
}

fn report_auth_error(error: &AuthError) {
    if let Some(fields) = error.field_errors() {
        for (field, message) in fields {
            eprintln!("  {field}: {message}");
        }
        return;
    }
    if let Some(notice) = Notice::for_error(error, None) {
        eprintln!("{}: {}", notice.title, notice.description);
    }
}

fn drain_events(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Redirect { to, reason } => {
                tracing::warn!(?reason, route = %to, "session dropped, sign in again");
            }
            other => tracing::debug!(event = ?other, "session event"),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
