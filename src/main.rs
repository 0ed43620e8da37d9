#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::prelude::*;

use ambient_monitor::app::agent_framework::{AgentRuntime, MonitoringAgentFactory};
use ambient_monitor::app::agent_url::{build_agent_url, resolve_agent_region};
use ambient_monitor::app::config::{AgentConfig, CONFIG_PATH_ENV};
use ambient_monitor::app::scheduled_monitor::{
    ScheduledCheckConfig, ScheduledMonitor, TokenClient, TokenConfigFile,
};
use ambient_monitor::app::server;

const DEFAULT_LOG_FILTER: &str =
    "ambient_monitor=info,aws_config=warn,aws_sigv4=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,hyper=warn,tower_http=info";

#[derive(Parser)]
#[command(name = "ambient-monitor")]
#[command(about = "AI-driven operational monitoring for AWS accounts")]
#[command(version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), ")"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host the agent over HTTP (POST /invocations, GET /ping)
    Serve {
        /// Agent configuration file
        #[arg(short, long, env = CONFIG_PATH_ENV)]
        config: Option<PathBuf>,
        /// Bind address; overrides server.bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run one scheduled check and post the report to Slack
    ScheduledCheck,
    /// Fetch a bearer token from the identity provider
    Token {
        #[arg(long, default_value = "cognito_config.json")]
        config: PathBuf,
        #[arg(long, value_enum, default_value_t = AuthMethod::ClientCredentials)]
        auth_method: AuthMethod,
        /// Required for the password method
        #[arg(long)]
        username: Option<String>,
        /// Required for the password method
        #[arg(long)]
        password: Option<String>,
        /// Write the token back to the config file as `bearer_token`
        #[arg(long)]
        update_config: bool,
    },
    /// Print the invocation URL for a hosted agent ARN
    AgentUrl {
        #[arg(long)]
        arn: String,
        #[arg(long)]
        region: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AuthMethod {
    ClientCredentials,
    Password,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    let file_layer = log_file().map(|(file, path)| {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false);
        (layer, path)
    });
    let (file_layer, log_path) = match file_layer {
        Some((layer, path)) => (Some(layer), Some(path)),
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    // Bridge log crate events from dependencies; must follow the subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize log-to-tracing bridge: {}", e);
    }

    if let Some(path) = log_path {
        tracing::info!("Logging to file: {:?}", path);
    }
}

/// Append-only log file under the platform data directory, when `AMBIENT_MONITOR_LOG_FILE=1`
fn log_file() -> Option<(std::fs::File, PathBuf)> {
    let enabled = std::env::var("AMBIENT_MONITOR_LOG_FILE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !enabled {
        return None;
    }

    let proj_dirs = directories::ProjectDirs::from("com", "", "ambient-monitor")?;
    let log_dir = proj_dirs.data_dir().join("logs");
    let _ = std::fs::create_dir_all(&log_dir);
    let log_path = log_dir.join("ambient-monitor.log");

    let file = match std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    // Owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(&log_path, std::fs::Permissions::from_mode(0o600)) {
            eprintln!("[SECURITY] Failed to set log file permissions: {}", e);
        }
    }

    Some((file, log_path))
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let crash_msg = format!(
            "ambient-monitor crashed!\n\
             Panic occurred at: {}\n\
             Details: {}\n\
             Backtrace:\n{:?}\n",
            panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string()),
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic"),
            std::backtrace::Backtrace::force_capture()
        );

        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "", "ambient-monitor") {
            let log_dir = proj_dirs.data_dir().join("logs");
            let _ = std::fs::create_dir_all(&log_dir);
            let crash_log_path = log_dir.join("crash.log");

            if let Ok(mut file) = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&crash_log_path)
            {
                use std::io::Write;
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "\n=== CRASH at {} ===\n{}", timestamp, crash_msg);
            }
        }
        eprintln!("\n{}", crash_msg);
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_panic_handler();
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Serve { config, bind } => run_server(config, bind).await,
        Commands::ScheduledCheck => {
            let config = ScheduledCheckConfig::from_env()?;
            ScheduledMonitor::new(config)?
                .run(chrono::Utc::now())
                .await?;
            Ok(())
        }
        Commands::Token {
            config,
            auth_method,
            username,
            password,
            update_config,
        } => fetch_token(config, auth_method, username, password, update_config).await,
        Commands::AgentUrl { arn, region } => {
            let arn = arn.trim();
            anyhow::ensure!(!arn.is_empty(), "No ARN provided");
            let region = resolve_agent_region(region.as_deref()).await;
            println!("\nInvocation URL:\n{}", build_agent_url(arn, &region));
            Ok(())
        }
    }
}

async fn run_server(config_path: Option<PathBuf>, bind: Option<String>) -> anyhow::Result<()> {
    let path = AgentConfig::resolve_path(config_path.as_deref());
    let config = AgentConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    let bind_address = bind.unwrap_or_else(|| config.server.bind_address.clone());
    let config_dir = path.parent().map(PathBuf::from);

    tracing::info!(
        "ambient-monitor {} ({}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT")
    );

    let runtime = AgentRuntime::new(Box::new(MonitoringAgentFactory::new(config, config_dir)));
    server::serve(Arc::new(runtime), &bind_address).await
}

async fn fetch_token(
    config_path: PathBuf,
    auth_method: AuthMethod,
    username: Option<String>,
    password: Option<String>,
    update_config: bool,
) -> anyhow::Result<()> {
    let mut config = TokenConfigFile::load(&config_path)?;
    let client = TokenClient::new(config.required("domain_url")?)?;

    let token = match auth_method {
        AuthMethod::ClientCredentials => {
            client
                .client_credentials(
                    config.required("m2m_client_id")?,
                    config.required("m2m_client_secret")?,
                    config.optional("resource_server_id"),
                )
                .await?
        }
        AuthMethod::Password => {
            let (Some(username), Some(password)) = (username, password) else {
                anyhow::bail!("Username and password are required for password auth method");
            };
            client
                .password(config.required("client_id")?, &username, &password)
                .await?
        }
    };

    println!("\nBearer Token:");
    println!("{}\n", token.access_token);
    println!("Token Type: {}", token.token_type());
    match token.expires_in {
        Some(secs) => println!("Expires In: {} seconds", secs),
        None => println!("Expires In: unknown"),
    }
    if let Some(scope) = &token.scope {
        println!("Scope: {}", scope);
    }

    if update_config {
        config.save_bearer_token(&token.access_token)?;
    }
    Ok(())
}
