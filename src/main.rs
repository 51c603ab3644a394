use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use yardwork::config::{GuardConfig, ServerConfig, UploadConfig};
use yardwork::jobs::validate::validate;
use yardwork::jobs::JobRequest;
use yardwork::server::Server;
use yardwork::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "yardwork")]
#[command(version)]
#[command(about = "Job lifecycle backend for a lawn care and snow removal marketplace")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server
    Server(ServerArgs),

    /// Check a job request JSON file against the validation rules
    Validate {
        /// Path to a JSON job request
        file: PathBuf,

        /// Output format
        #[arg(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Server Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ServerArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Maximum number of stored jobs
    #[arg(long, default_value = "10000")]
    max_jobs: usize,

    /// Frontend origins allowed to call the API (comma-separated).
    /// When empty, origin restriction is disabled.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Mutating requests allowed per IP per minute
    #[arg(long, default_value = "600")]
    rate_limit: usize,

    // === Photo uploads ===
    /// S3 bucket for job photos. Uploads are disabled when unset.
    #[arg(long, env = "S3_BUCKET_NAME")]
    s3_bucket: Option<String>,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-2")]
    aws_region: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    aws_secret_access_key: Option<String>,
}

// =============================================================================
// JSON Output Types
// =============================================================================

#[derive(Serialize)]
struct ValidationOutput {
    valid: bool,
    errors: Vec<String>,
}

// =============================================================================
// Server Implementation
// =============================================================================

fn upload_config(args: &ServerArgs) -> Option<UploadConfig> {
    match (&args.s3_bucket, &args.aws_access_key_id, &args.aws_secret_access_key) {
        (Some(bucket), Some(key_id), Some(secret)) => Some(UploadConfig::new(
            bucket.clone(),
            args.aws_region.clone(),
            key_id.clone(),
            secret.clone(),
        )),
        (Some(bucket), _, _) => {
            tracing::warn!(bucket = %bucket, "S3 bucket set without AWS credentials, uploads disabled");
            None
        }
        _ => None,
    }
}

async fn run_server(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let listen_addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let guard = GuardConfig {
        allowed_origins: args
            .allowed_origins
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
        rate_limit_requests: args.rate_limit,
        ..GuardConfig::default()
    };

    let mut config = ServerConfig {
        listen_addr,
        max_jobs: args.max_jobs,
        guard,
        uploads: None,
    };
    if let Some(uploads) = upload_config(&args) {
        config = config.with_uploads(uploads);
    }

    tracing::info!(
        listen_addr = %config.listen_addr,
        max_jobs = config.max_jobs,
        allowed_origins = ?config.guard.allowed_origins,
        rate_limit = config.guard.rate_limit_requests,
        "Starting yardwork server"
    );

    let shutdown = install_shutdown_handler();
    Server::new(config).run(shutdown).await?;

    Ok(())
}

// =============================================================================
// Validate Command
// =============================================================================

fn handle_validate(file: PathBuf, output_format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(&file)?;
    let request: JobRequest = serde_json::from_str(&raw)?;
    let errors = validate(&request);

    match output_format {
        OutputFormat::Json => {
            let output = ValidationOutput {
                valid: errors.is_empty(),
                errors: errors.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            if errors.is_empty() {
                println!("{}: valid job request", file.display());
            } else {
                println!("{}: {} problem(s)", file.display(), errors.len());
                println!("{}", "-".repeat(40));
                for error in &errors {
                    println!("  - {}", error);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err("job request failed validation".into())
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Server(server_args) => {
            run_server(server_args).await?;
        }
        Commands::Validate { file, output } => {
            handle_validate(file, &output)?;
        }
    }

    Ok(())
}
