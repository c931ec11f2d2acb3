use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use itemvault::auth::{
    DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_BCRYPT_COST, DEFAULT_TOKEN_TTL_MINUTES,
    PasswordVerifier,
};
use itemvault::config::{
    DEFAULT_ALGORITHM, DEFAULT_APP_ENV, DEFAULT_APP_NAME, DEFAULT_BIND, load_credentials,
    process_env,
};
use itemvault::{AppConfig, ReadAccess, create_app};

#[derive(Parser)]
#[command(name = "itemvault")]
#[command(about = "Item management API with bearer token authentication")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve(ServeArgs),
    /// Print a bcrypt digest for a password, for provisioning users
    HashPassword {
        password: String,
        #[arg(long, default_value_t = DEFAULT_BCRYPT_COST)]
        cost: u32,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// HMAC signing secret for access tokens
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: String,
    #[arg(long, env = "ALGORITHM", default_value = DEFAULT_ALGORITHM)]
    algorithm: String,
    /// Lifetime of tokens issued by POST /token
    #[arg(
        long,
        env = "ACCESS_TOKEN_EXPIRE_MINUTES",
        default_value_t = DEFAULT_ACCESS_TOKEN_TTL_MINUTES
    )]
    access_token_expire_minutes: i64,
    /// Lifetime of tokens issued without an explicit ttl
    #[arg(
        long,
        env = "DEFAULT_TOKEN_EXPIRE_MINUTES",
        default_value_t = DEFAULT_TOKEN_TTL_MINUTES
    )]
    default_token_expire_minutes: i64,
    /// Whether item reads need a session
    #[arg(long, env = "ITEMS_READ_ACCESS", value_enum, default_value_t = ReadAccess::Open)]
    read_access: ReadAccess,
    #[arg(long, env = "BCRYPT_COST", default_value_t = DEFAULT_BCRYPT_COST)]
    bcrypt_cost: u32,
    /// JSON credential table; USER{N}_* environment variables are read as well
    #[arg(long, env = "USERS_FILE")]
    users_file: Option<PathBuf>,
    #[arg(long, env = "APP_BIND", default_value = DEFAULT_BIND)]
    bind: String,
    #[arg(long, env = "APP_NAME", default_value = DEFAULT_APP_NAME)]
    app_name: String,
    #[arg(long, env = "APP_ENV", default_value = DEFAULT_APP_ENV)]
    app_env: String,
}

/// Used when `RUST_LOG` is unset or empty.
const DEFAULT_LOG_DIRECTIVES: &str = "itemvault=info,tower_http=info";

/// `RUST_LOG` directives when present, otherwise [`DEFAULT_LOG_DIRECTIVES`].
fn log_filter(rust_log: Option<&str>) -> Result<EnvFilter> {
    let directives = rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(DEFAULT_LOG_DIRECTIVES);
    EnvFilter::try_new(directives)
        .with_context(|| format!("Invalid log directives {:?}", directives))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref())?)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::HashPassword { password, cost } => {
            let digest = PasswordVerifier::new(cost)
                .hash(&password)
                .context("Failed to hash password")?;
            println!("{}", digest);
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let credentials = load_credentials(args.users_file.as_deref(), process_env)
        .context("Failed to load credentials")?;

    let config = AppConfig {
        secret_key: args.secret_key,
        algorithm: args.algorithm,
        access_token_ttl_minutes: args.access_token_expire_minutes,
        default_token_ttl_minutes: args.default_token_expire_minutes,
        read_access: args.read_access,
        bcrypt_cost: args.bcrypt_cost,
        credentials,
        app_name: args.app_name,
        app_env: args.app_env,
        bind: args.bind,
    };

    info!(
        "Starting {} in {} mode (item reads: {})",
        config.app_name, config.app_env, config.read_access
    );
    let app = create_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
