//! Payment System - process entry point
//!
//! ```text
//! payment_system auth      [--env dev]   # register/login + internal key endpoint
//! payment_system payments  [--env dev]   # deposit/withdraw/transfer/balances
//! payment_system migrate up|down [--env dev]
//! payment_system keygen                  # print a fresh JWT_SECRET
//! ```
//!
//! ```text
//! ┌────────────┐  GET /jwt-public-key  ┌────────────┐
//! │  payments  │──────────────────────▶│    auth    │
//! │ (KeyTrust) │   (startup+refresh)   │ (Ed25519)  │
//! └─────┬──────┘                       └─────┬──────┘
//!       └──────────── PostgreSQL ────────────┘
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use payment_system::account::{AccountLedger, PgLedgerStore, PgUserDirectory};
use payment_system::auth::{HttpKeySource, KeyTrustCache, TokenVerifier};
use payment_system::config::AppConfig;
use payment_system::db::Database;
use payment_system::gateway::{self, state::AuthServiceState, state::PaymentsState};
use payment_system::transfer::TransferCoordinator;
use payment_system::user_auth::{IssuerKeys, TokenIssuer, UserAuthService};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Positional arguments with `--env <value>` removed
fn positional_args() -> Vec<String> {
    let mut out = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--env" || arg == "-e" {
            args.next();
            continue;
        }
        out.push(arg);
    }
    out
}

fn usage() -> &'static str {
    "usage: payment_system <auth|payments|migrate up|migrate down|keygen> [--env <name>]"
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = positional_args();
    if args.first().map(String::as_str) == Some("keygen") {
        return match IssuerKeys::generate() {
            Ok(keys) => {
                println!("JWT_SECRET={}", keys.secret_base64());
                println!("# public key: {}", keys.public_key_base64());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("keygen failed: {:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    let env = get_env();
    let app_config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config '{}': {:#}", env, e);
            return ExitCode::FAILURE;
        }
    };

    let role = args.first().map(String::as_str).unwrap_or("");
    let _log_guard = payment_system::logging::init_logging(&app_config, role_label(role));

    tracing::info!(env = %env, role, "Starting payment_system");

    let result = match role {
        "auth" => run_auth(&app_config).await,
        "payments" => run_payments(&app_config).await,
        "migrate" => run_migrate(&app_config, args.get(1).map(String::as_str)).await,
        _ => {
            eprintln!("{}", usage());
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(role, error = ?e, "Process failed");
            eprintln!("{} failed: {:#}", role, e);
            ExitCode::FAILURE
        }
    }
}

fn role_label(role: &str) -> &str {
    match role {
        "auth" | "payments" | "migrate" => role,
        _ => "cli",
    }
}

async fn connect_db(config: &AppConfig) -> Result<Database> {
    let url = config.database_url()?;
    Database::connect(url, config.max_connections)
        .await
        .context("failed to connect to PostgreSQL")
}

async fn run_migrate(config: &AppConfig, direction: Option<&str>) -> Result<()> {
    let db = connect_db(config).await?;
    match direction {
        Some("up") => db.migrate().await.context("migration failed")?,
        Some("down") => db.undo_migrations().await.context("migration revert failed")?,
        _ => bail!("{}", usage()),
    }
    Ok(())
}

async fn run_auth(config: &AppConfig) -> Result<()> {
    let keys = IssuerKeys::from_base64_secret(config.jwt_secret()?)
        .context("invalid JWT signing secret")?;
    tracing::info!(key_fingerprint = %keys.fingerprint(), "Signing key loaded");

    let db = connect_db(config).await?;
    let issuer = TokenIssuer::new(keys, config.auth.token_ttl_secs);
    let state = Arc::new(AuthServiceState::new(UserAuthService::new(
        db.pool().clone(),
        issuer,
    )));

    let public_addr = config.auth_addr();
    let internal_addr = config.auth_internal_addr();
    tokio::try_join!(
        gateway::serve("auth", &public_addr, gateway::auth_router(state.clone())),
        gateway::serve("auth-internal", &internal_addr, gateway::internal_router(state)),
    )?;
    Ok(())
}

async fn run_payments(config: &AppConfig) -> Result<()> {
    let trust = &config.key_trust;
    let source = HttpKeySource::new(trust.endpoint.clone(), trust.fetch_timeout())?;
    let keys = Arc::new(KeyTrustCache::new(Arc::new(source), trust.fetch_timeout()));

    // Refuse to serve requests we could not authenticate
    keys.initialize(trust.startup_attempts, trust.retry_delay())
        .await
        .context("could not obtain the auth service public key")?;
    let _refresh = keys.clone().spawn_refresh(trust.refresh_interval());

    let db = connect_db(config).await?;
    let store = Arc::new(PgLedgerStore::new(db.pool().clone()));
    let users = Arc::new(PgUserDirectory::new(db.pool().clone()));

    let verifier = Arc::new(TokenVerifier::new(keys, users.clone(), trust.leeway_secs));
    let state = Arc::new(PaymentsState::new(
        AccountLedger::new(store.clone()),
        TransferCoordinator::new(store, users),
        verifier,
    ));

    gateway::serve("payments", &config.payments_addr(), gateway::payments_router(state)).await
}
