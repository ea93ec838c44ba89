//! routeguard
//!
//! Route-level enable/public policy gate for REST APIs.

use clap::{Parser, Subcommand};
use routeguard::{
    config::{AppConfig, LogFormat, load_config},
    policy::build_tree,
    registry::RouteRegistry,
    server::{AppState, run_server},
    store::PolicyStore,
};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Route policy gate - enable REST routes one by one, public or authenticated
#[derive(Parser, Debug)]
#[command(name = "routeguard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "ROUTEGUARD_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "ROUTEGUARD_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the policy tree (saved settings completed with registered routes)
    Tree,

    /// Show the verdict for a request; exits non-zero unless it is allowed
    Check {
        /// Request method
        method: String,

        /// Request path, e.g. /wp/v2/posts/42
        path: String,

        /// Evaluate as an authenticated caller
        #[arg(long)]
        authenticated: bool,
    },

    /// Run the HTTP server with the gate and admin API
    Serve {
        /// Override the configured bind host
        #[arg(long, env = "ROUTEGUARD_HOST")]
        host: Option<String>,

        /// Override the configured port
        #[arg(long, env = "ROUTEGUARD_PORT")]
        port: Option<u16>,
    },
}

fn init_logging(config: &AppConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    init_logging(&config, args.log_level.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "Starting routeguard");

    if let Command::Serve { host, port } = &args.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
    }

    let state = AppState::from_config(&config)
        .inspect_err(|e| error!(error = %e, "Failed to initialise policy components"))?;

    match args.command {
        Command::Tree => {
            let saved = state
                .store
                .get(&state.store_key)
                .await
                .inspect_err(|e| error!(error = %e, "Failed to read saved policy"))?;
            let tree = build_tree(state.registry.patterns(), saved);
            println!("{}", serde_json::to_string_pretty(&tree.listing())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            method,
            path,
            authenticated,
        } => {
            let tree = state
                .store
                .load(&state.store_key)
                .await
                .inspect_err(|e| error!(error = %e, "Failed to read saved policy"))?;
            let routes = state.registry.route_table();
            let (verdict, pattern) =
                routes.evaluate_match(&method, &path, &tree, || authenticated);

            match pattern {
                Some(pattern) => println!("{verdict}\t{pattern}"),
                None => println!("{verdict}"),
            }
            Ok(if verdict.is_allowed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Serve { .. } => {
            run_server(&config, state).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
