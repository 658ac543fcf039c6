//! Coupon Migrator CLI - migrate BigCommerce legacy coupons from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Save and verify store credentials
//! cm-cli setup --store-hash abc123 --access-token xxxxxxxx
//!
//! # Check the saved credentials
//! cm-cli test-connection
//!
//! # Back up legacy coupons
//! cm-cli export-legacy --format csv
//!
//! # Migrate the backup
//! cm-cli migrate coupon-export-2024-05-01.csv
//! ```
//!
//! # Environment Variables
//!
//! - `CM_SERVER_URL` - Coupon migrator server (default: `http://127.0.0.1:3001`)
//! - `CM_CREDENTIALS_FILE` - Credentials file (default: `~/.coupon-migrator.yaml`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod api;
mod commands;
mod credentials;
mod error;
mod prompt;

use api::{ApiClient, DEFAULT_SERVER_URL};
use commands::export::Format;
use commands::migrate::MigrateArgs;
use credentials::StoreCredentials;
use error::CliError;

#[derive(Parser)]
#[command(name = "cm-cli")]
#[command(author, version, about = "BigCommerce legacy coupon migration")]
struct Cli {
    /// Coupon migrator server URL
    #[arg(long, global = true, env = "CM_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Credentials file
    #[arg(long, global = true, env = "CM_CREDENTIALS_FILE")]
    credentials_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save store credentials
    Setup {
        /// Store hash from the API path
        #[arg(long)]
        store_hash: String,

        /// API account access token
        #[arg(long, env = "CM_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,

        /// Channel for new promotions (default: 1)
        #[arg(long)]
        channel_id: Option<i64>,

        /// Save without checking the credentials
        #[arg(long)]
        no_verify: bool,
    },
    /// Check the saved credentials
    TestConnection,
    /// Export legacy coupons
    ExportLegacy {
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Output file (default: coupon-export-<date>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export V3 coupon promotions as migration input
    ExportPromotions {
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Output file (default: promotion-export-<date>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only list coupon promotions
        #[arg(long)]
        list: bool,
    },
    /// Migrate coupons from a CSV or JSON file
    Migrate {
        /// Coupon file (.csv or .json)
        file: PathBuf,

        /// Coupons per server request
        #[arg(long, default_value_t = 50)]
        batch_size: usize,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Retry retryable failures once without asking
        #[arg(long)]
        retry: bool,

        /// Write created/deleted/error records as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cm_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let credentials_file = match cli.credentials_file {
        Some(path) => path,
        None => credentials::default_path()?,
    };
    let connect = || -> Result<ApiClient, CliError> {
        ApiClient::new(&cli.server_url, StoreCredentials::load(&credentials_file)?)
    };

    match cli.command {
        Commands::Setup {
            store_hash,
            access_token,
            channel_id,
            no_verify,
        } => {
            commands::setup::run(
                &credentials_file,
                &cli.server_url,
                store_hash,
                access_token,
                channel_id,
                !no_verify,
            )
            .await
        }
        Commands::TestConnection => commands::connection::run(&connect()?).await,
        Commands::ExportLegacy { format, output } => {
            commands::export::legacy(&connect()?, format, output).await
        }
        Commands::ExportPromotions {
            format,
            output,
            list,
        } => commands::export::promotions(&connect()?, format, output, list).await,
        Commands::Migrate {
            file,
            batch_size,
            yes,
            retry,
            report,
        } => {
            let args = MigrateArgs {
                file,
                batch_size,
                yes,
                retry,
                report,
            };
            commands::migrate::run(&connect()?, args).await
        }
    }
}
