// crates/gcoin-cli/src/main.rs
//
// CLI entrypoint for the GCoin ledger tools.
//
// Keeps a ledger state file on disk and provides subcommands to initialize
// it, replay scripted calls against it, dry-run a single call, and inspect
// balances, cards, invoices, and fees.

mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use config::LedgerConfig;
use output::OutputFormat;

/// GCoin CLI: asset-backed multi-card ledger tools.
#[derive(Parser, Debug)]
#[command(
    name = "gcoin",
    version = "0.1.0",
    about = "GCoin ledger CLI: replay calls and inspect balances, cards, fees, and invoices"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "gcoin.toml")]
    config: String,

    /// Output format: table or json. Overrides the config file.
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a fresh ledger state file from the configuration.
    Init {
        /// Overwrite an existing state file.
        #[arg(long)]
        force: bool,
        /// Setup time in unix seconds. Defaults to now, or to the configured
        /// fee anchor when that is earlier.
        #[arg(long)]
        at: Option<u64>,
    },

    /// Execute a JSON script of ledger calls and commit the results.
    Replay {
        /// Path to the script file.
        script: String,
        /// Default call time for steps without their own.
        #[arg(long)]
        at: Option<u64>,
    },

    /// List aggregate balances with accrued fees.
    Balances {
        #[arg(long)]
        at: Option<u64>,
    },

    /// List every card, or one account's card positions.
    Cards {
        /// `0x…` address or label.
        account: Option<String>,
    },

    /// List open redemption invoices.
    Invoices,

    /// Show the fee state of one account.
    Fee {
        account: String,
        #[arg(long)]
        at: Option<u64>,
    },

    /// Dry-run a single JSON-encoded call without saving.
    Simulate {
        /// Path to the call file.
        call: String,
        /// Caller address or label (defaults to the admin).
        #[arg(long)]
        caller: Option<String>,
        #[arg(long)]
        at: Option<u64>,
    },

    /// Print the address derived from a label.
    Address { label: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config is read first so its log level can seed the filter.
    let loaded = LedgerConfig::load(&cli.config);
    let config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => LedgerConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &loaded {
        Ok(_) => tracing::debug!("Loaded configuration from {}", cli.config),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            cli.config,
            e
        ),
    }

    let format = match cli.format {
        Some(format) => format,
        None => config.output.parse()?,
    };

    match &cli.command {
        Commands::Init { force, at } => commands::init::run(&config, *force, *at)?,
        Commands::Replay { script, at } => commands::replay::run(&config, format, script, *at)?,
        Commands::Balances { at } => commands::query::balances(&config, format, *at)?,
        Commands::Cards { account } => commands::query::cards(&config, format, account.as_deref())?,
        Commands::Invoices => commands::query::invoices(&config, format)?,
        Commands::Fee { account, at } => commands::query::fee(&config, format, account, *at)?,
        Commands::Simulate { call, caller, at } => {
            commands::simulate::run(&config, format, call, caller.as_deref(), *at)?
        }
        Commands::Address { label } => commands::query::address(label)?,
    }

    Ok(())
}
