mod commands;
mod config;
mod error;
mod logging;
mod report;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use identity_resolver_sdk::Strategy;

use crate::config::{AppConfig, Purpose};
use crate::error::AppError;

/// graphctl - search, delete and invite directory users
#[derive(Parser)]
#[command(name = "graphctl")]
#[command(about = "Search, delete and invite directory users through Microsoft Graph")]
#[command(version)]
struct Cli {
    /// Path to configuration file (default: ./graphctl.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print effective configuration (JSON, secret redacted) and exit
    #[arg(long, global = true)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the users a query resolves to
    Search(LookupArgs),
    /// Delete the single user a query resolves to
    Delete {
        #[command(flatten)]
        lookup: LookupArgs,

        /// Resolve and report, but do not delete
        #[arg(long)]
        dry_run: bool,
    },
    /// Invite a guest user
    Invite {
        /// Email address to invite
        email: String,

        /// Redirect URL after redemption (overrides invite.redirect_url)
        #[arg(long)]
        redirect_url: Option<String>,

        /// Whether the directory emails the invitation (true/false)
        #[arg(long, action = ArgAction::Set)]
        send_message: Option<bool>,

        /// Validate input, but do not send the invitation
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate configuration and exit
    Check,
}

#[derive(Args)]
struct LookupArgs {
    /// Object id, principal name, email address or display-name prefix
    query: String,

    /// Lookup strategy: auto, by-id, by-upn, by-email, by-name-prefix
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Maximum number of matches per filtered lookup (overrides search.max_results)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    max_results: Option<u32>,
}

impl Commands {
    fn purpose(&self) -> Purpose {
        match self {
            Commands::Search(_) | Commands::Delete { .. } => Purpose::Resolve,
            Commands::Invite { .. } => Purpose::Invite,
            Commands::Check => Purpose::Check,
        }
    }

    /// Fold command-line flags into the loaded configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        match self {
            Commands::Search(lookup) | Commands::Delete { lookup, .. } => {
                if let Some(strategy) = lookup.strategy {
                    config.search.strategy = strategy;
                }
                if let Some(max_results) = lookup.max_results {
                    config.search.max_results = max_results;
                }
            }
            Commands::Invite {
                redirect_url,
                send_message,
                ..
            } => {
                if let Some(url) = redirect_url {
                    config.invite.redirect_url = Some(url.clone());
                }
                if let Some(send) = send_message {
                    config.invite.send_invitation_message = *send;
                }
            }
            Commands::Check => {}
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let command = cli.command.unwrap_or(Commands::Check);

    // 1) defaults -> 2) YAML -> 3) env (GRAPHCTL__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    command.apply_overrides(&mut config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if cli.print_config {
        writeln!(out, "{}", config.to_json()?)?;
        return Ok(());
    }

    config.validate(command.purpose())?;
    let _log_guard = logging::init(&config.logging, cli.verbose).map_err(AppError::Logging)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "graphctl starting");

    if matches!(command, Commands::Check) {
        report::config_valid(&mut out)?;
        return Ok(());
    }

    let service = commands::connect(&config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let strategy = config.search.strategy;
        match command {
            Commands::Search(lookup) => {
                commands::search(&service, &lookup.query, strategy, &mut out).await
            }
            Commands::Delete { lookup, dry_run } => {
                commands::delete(&service, &lookup.query, strategy, dry_run, &mut out).await
            }
            Commands::Invite { email, dry_run, .. } => {
                // Presence checked by validate(Purpose::Invite).
                commands::invite(
                    &service,
                    &email,
                    config.invite.redirect_url.as_deref().unwrap_or_default(),
                    config.invite.send_invitation_message,
                    dry_run,
                    &mut out,
                )
                .await
            }
            Commands::Check => Ok(()),
        }
    })
}
