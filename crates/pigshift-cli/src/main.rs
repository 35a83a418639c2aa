//! Command-line interface for `pigshift`.
//!
//! This binary is a thin façade over [`pigshift_core`]: it parses arguments,
//! configures logging, and delegates to the library. It is meant to be called
//! by a pipeline scheduler as one unit of work; a non-zero exit status tells the
//! scheduler the unit failed.
//!
//! # Available Commands
//!
//! - `columns` - Derive Redshift column definitions from a Pig schema file
//! - `upload` - Copy one local file to an object store, unless already there
//! - `download` - Copy one remote object to local disk, unless already there

mod display;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use pigshift_core::PigshiftError;
use pigshift_core::config::{RedshiftCredentials, StoreOptions, open_store, parse_key_value};
use pigshift_core::redshift::{CopyPigOutputToRedshift, DEFAULT_ALIAS_DEPTH};
use pigshift_core::transfer::{TransferOutcome, run_transfer};
use pigshift_core::types::{Direction, TransferSpec};

#[derive(Parser)]
#[command(
    name = "pigshift",
    version,
    about = "Load Pig output into Redshift and move single files to and from object storage"
)]
/// Command-line arguments and options for the `pigshift` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `pigshift` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Derives Redshift column definitions from a Pig `.pig_schema` file.
    Columns {
        /// Location of the schema file (local path or URL such as `s3://bucket/out/.pig_schema`).
        #[arg(short, long, value_name = "LOCATION")]
        schema: String,

        /// Number of join aliases kept in front of each column name.
        #[arg(long, value_name = "N", default_value_t = DEFAULT_ALIAS_DEPTH)]
        alias_depth: usize,

        /// Key clause appended after the columns, e.g. `"PRIMARY KEY=(id)"`.
        #[arg(short, long = "key", value_name = "NAME=VALUE")]
        keys: Vec<String>,

        /// Target table; prints the `CREATE TABLE` statement when given.
        #[arg(short, long, value_name = "TABLE")]
        table: Option<String>,

        /// Data location to load; prints the `COPY` statement when given.
        #[arg(long, value_name = "URL", requires = "table")]
        copy_from: Option<String>,

        /// Options appended to the `COPY` statement.
        #[arg(long, value_name = "OPTIONS", default_value = "")]
        copy_options: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Uploads `<local-dir>/<file>` to `<remote>/<file>` unless it already exists.
    Upload(TransferArgs),

    /// Downloads `<remote>/<file>` to `<local-dir>/<file>` unless it already exists.
    Download(TransferArgs),
}

/// Arguments shared by the transfer subcommands.
#[derive(Args)]
struct TransferArgs {
    /// Remote prefix holding the file (e.g. `s3://bucket/exports`).
    #[arg(short, long, value_name = "URL")]
    remote: String,

    /// Local directory holding the file.
    #[arg(short, long, value_name = "DIR")]
    local_dir: PathBuf,

    /// Name of the file on both sides.
    #[arg(short, long, value_name = "NAME")]
    file: String,

    #[command(flatten)]
    store: StoreArgs,
}

/// Object store options layered over the environment.
#[derive(Args)]
struct StoreArgs {
    /// Extra object store option, e.g. `aws_endpoint=http://localhost:9000`.
    #[arg(long = "store-option", value_name = "KEY=VALUE")]
    store_options: Vec<String>,
}

impl StoreArgs {
    fn resolve(&self) -> Result<StoreOptions> {
        self.store_options
            .iter()
            .try_fold(StoreOptions::from_env(), |options, raw| -> Result<_> {
                let (key, value) = parse_key_value("store-option", raw)?;
                Ok(options.with_option(key, value))
            })
    }
}

/// Entry point for the `pigshift` command-line interface.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        },
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<PigshiftError>() {
        Some(e) => {
            eprintln!("Error: {}", e.user_message());
            if let Some(suggestion) = e.recovery_suggestion() {
                eprintln!("Hint: {suggestion}");
            }
        },
        None => eprintln!("Error: {error:#}"),
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Columns {
            schema,
            alias_depth,
            keys,
            table,
            copy_from,
            copy_options,
            store,
        } => {
            info!("Resolving columns from {schema}");
            let options = store.resolve()?;
            handle_columns(
                &schema,
                alias_depth,
                &keys,
                table.as_deref(),
                copy_from.as_deref(),
                &copy_options,
                &options,
            )
            .await
        },
        Commands::Upload(args) => {
            let outcome = handle_transfer(&args, Direction::LocalToRemote).await?;
            println!("{outcome}");
            Ok(())
        },
        Commands::Download(args) => {
            let outcome = handle_transfer(&args, Direction::RemoteToLocal).await?;
            println!("{outcome}");
            Ok(())
        },
    }
}

async fn handle_columns(
    schema: &str,
    alias_depth: usize,
    keys: &[String],
    table: Option<&str>,
    copy_from: Option<&str>,
    copy_options: &str,
    options: &StoreOptions,
) -> Result<()> {
    let (store, location) = open_store(schema, options)?;
    debug!("Schema object: {location}");

    let mut task = CopyPigOutputToRedshift::new(table.unwrap_or_default(), location)
        .with_alias_depth(alias_depth)
        .with_copy_options(copy_options);
    for raw in keys {
        let (name, value) = parse_key_value("key", raw)?;
        task = task.with_table_key(name, value);
    }

    let plan = task.prepare(store).await?;
    display::print_columns(&plan.columns);

    if table.is_some() {
        println!("\n{}", plan.create_table_statement());
    }
    if let Some(data_url) = copy_from {
        let credentials = RedshiftCredentials::from_env()?;
        println!("{}", plan.copy_statement(data_url, &credentials));
    }
    Ok(())
}

async fn handle_transfer(args: &TransferArgs, direction: Direction) -> Result<TransferOutcome> {
    if matches!(args.file.as_str(), "" | "." | "..") || args.file.contains('/') {
        return Err(anyhow!(
            "File name '{}' must be a single path component.",
            args.file
        ));
    }

    let options = args.store.resolve()?;
    let (store, remote) = open_store(&args.remote, &options)?;
    let spec = TransferSpec::new(remote, &args.local_dir, &args.file, direction);
    info!(
        "Starting {}: {} <-> {}/{}",
        direction.as_str(),
        spec.local_path().display(),
        args.remote.trim_end_matches('/'),
        args.file
    );

    let endpoints = spec.endpoints(store);
    Ok(run_transfer(endpoints.as_ref()).await?)
}
