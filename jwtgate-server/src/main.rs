//! jwtgate-server: JWT login, refresh and a gated demo route over HTTP/1.1

use anyhow::{anyhow, Context};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, ValueEnum};
use hyper::StatusCode;
use jwtgate_core::{JwtConfig, StaticUsers, UnauthorizedStyle};
use jwtgate_server::{GateServer, JwtAuth, Routes};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KeyEncoding {
    Raw,
    Base64,
}

#[derive(Parser, Debug)]
#[command(name = "jwtgate-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Realm named in challenge responses
    #[arg(long, env = "JWTGATE_REALM")]
    realm: Option<String>,

    /// Signing key (HMAC secret, or 32-byte Ed25519 seed)
    #[arg(long, env = "JWTGATE_KEY", hide_env_values = true)]
    key: Option<String>,

    #[arg(long, value_enum, default_value = "raw")]
    key_encoding: KeyEncoding,

    /// HS256, HS384, HS512 or EdDSA
    #[arg(long, default_value = "HS256")]
    algorithm: String,

    /// Token lifetime; 0 means the default of one hour
    #[arg(long, default_value_t = 3600)]
    timeout_secs: u64,

    /// Refresh window measured from the original login; 0 disables refresh
    #[arg(long, default_value_t = 0)]
    max_refresh_secs: u64,

    /// Answer rejected requests with 401 and a WWW-Authenticate challenge
    #[arg(long)]
    prompt: bool,

    /// Status code for rejected requests when not prompting
    #[arg(long, default_value_t = 200, conflicts_with = "prompt")]
    silent_status: u16,

    /// Accepted credentials, repeatable
    #[arg(long = "user", value_name = "NAME:PASSWORD", value_parser = parse_user)]
    users: Vec<(String, String)>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn parse_user(value: &str) -> Result<(String, String), String> {
    match value.split_once(':') {
        Some((name, password)) if !name.is_empty() => {
            Ok((name.to_string(), password.to_string()))
        }
        _ => Err(format!("expected NAME:PASSWORD, got {:?}", value)),
    }
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_config(args: &Args) -> anyhow::Result<JwtConfig> {
    let mut builder = JwtConfig::builder()
        .signing_algorithm(args.algorithm.as_str())
        .timeout(Duration::from_secs(args.timeout_secs))
        .max_refresh(Duration::from_secs(args.max_refresh_secs));

    if let Some(realm) = &args.realm {
        builder = builder.realm(realm.as_str());
    }

    if let Some(key) = &args.key {
        let key = match args.key_encoding {
            KeyEncoding::Raw => key.as_bytes().to_vec(),
            KeyEncoding::Base64 => STANDARD
                .decode(key)
                .context("signing key is not valid base64")?,
        };
        builder = builder.key(key);
    }

    if !args.users.is_empty() {
        builder = builder.authenticator(args.users.iter().cloned().collect::<StaticUsers>());
    }

    builder = if args.prompt {
        builder.prompt()
    } else {
        let status = StatusCode::from_u16(args.silent_status)
            .map_err(|_| anyhow!("invalid silent status {}", args.silent_status))?;
        builder.unauthorized(UnauthorizedStyle::Silent { status })
    };

    builder.build().context("invalid configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let config = build_config(&args)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        realm = config.realm(),
        algorithm = config.codec().algorithm(),
        timeout_secs = config.timeout().as_secs(),
        max_refresh_secs = config.max_refresh().as_secs(),
        users = args.users.len(),
        "Starting jwtgate-server"
    );

    let server = GateServer::new(Routes::new(JwtAuth::new(config)));
    server
        .serve(args.bind, shutdown_signal())
        .await
        .with_context(|| format!("failed to serve on {}", args.bind))?;

    info!("jwtgate-server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
