use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mr3_core::config::ScraperConfig;
use mr3_core::database::Database;
use mr3_core::fandom::MonsterScraper;
use mr3_core::http::WikiClient;
use mr3_core::parsers::{parse_attack_file, parse_characteristic_file};
use mr3_core::{SqlRow, render_insert, render_json};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(
    name = "mr3",
    version,
    about = "Generate SQL INSERT statements for Monster Rancher 3 attacks, characteristics and monsters",
    long_about = None
)]
struct Cli {
    /// Also insert the records into this SQLite database
    #[arg(long, global = true)]
    database: Option<std::path::PathBuf>,

    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/mr3-sql.log")]
    log_file: std::path::PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the Attack INSERT from an attack text dump
    Attacks {
        /// Attack dump with `Derivation:` sections and `Attack:` records
        input_file: std::path::PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Sql)]
        format: OutputFormat,
    },

    /// Build the Characteristic INSERT from a `Name;Description` file
    Characteristics {
        /// Semicolon-delimited file with a header row
        input_file: std::path::PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Sql)]
        format: OutputFormat,
    },

    /// Scrape the fandom wiki and build the Monster INSERT
    Monsters {
        /// Stop after this many monsters (0 = all)
        #[arg(long, default_value_t = 0)]
        count: usize,
        /// TOML file overriding scraper settings
        #[arg(long, env = "MR3_CONFIG")]
        config: Option<std::path::PathBuf>,
        /// Skip monsters whose wiki page can't be resolved instead of aborting
        #[arg(long, default_value_t = false)]
        skip_missing: bool,
        /// Don't echo each monster as it is found (implied by `--format json`)
        #[arg(long, default_value_t = false)]
        quiet: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Sql)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One INSERT statement
    Sql,
    /// Pretty-printed JSON array of records
    Json,
}

fn setup_logging(verbose: u8, log_file: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(std::path::Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("mr3-sql.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

/// Parse arguments; usage errors exit with status 1, `--help`/`--version` with 0.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match usage_exit_code(&e) {
            None => e.exit(),
            Some(code) => {
                let _ = e.print();
                std::process::exit(code);
            }
        },
    }
}

/// Exit status for a parse failure, or `None` when clap's own exit (status 0 for `--help`/`--version`) applies.
fn usage_exit_code(e: &clap::Error) -> Option<i32> {
    e.use_stderr().then_some(1)
}

/// Whether `Got #NNN` lines go to stdout; JSON mode keeps stdout a single JSON document.
fn echo_progress(quiet: bool, format: OutputFormat) -> bool {
    !quiet && format == OutputFormat::Sql
}

/// Print records to stdout and optionally load them into the database.
fn emit<T: SqlRow + Serialize>(rows: &[T], format: OutputFormat, database: Option<&std::path::Path>) -> Result<()> {
    match format {
        OutputFormat::Sql => println!("{}", render_insert(rows)),
        OutputFormat::Json => println!("{}", render_json(rows)?),
    }

    if let Some(db_path) = database {
        let mut db = Database::new(db_path)?;
        db.insert_rows(rows)?;
        info!(
            "{} now holds {} rows in {}",
            db_path.display(),
            db.count_rows(T::TABLE)?,
            T::TABLE
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    info!("Starting mr3 CLI");

    let database = cli.database.as_deref();
    match cli.command {
        Commands::Attacks { input_file, format } => {
            if !input_file.exists() {
                anyhow::bail!("Input file not found: {:?}", input_file);
            }
            let attacks = parse_attack_file(&input_file)?;
            emit(&attacks, format, database)?;
        }
        Commands::Characteristics { input_file, format } => {
            if !input_file.exists() {
                anyhow::bail!("Input file not found: {:?}", input_file);
            }
            let characteristics = parse_characteristic_file(&input_file)?;
            emit(&characteristics, format, database)?;
        }
        Commands::Monsters { count, config, skip_missing, quiet, format } => {
            let mut scraper_config = match config {
                Some(path) => ScraperConfig::from_file(&path)
                    .map_err(|e| anyhow::anyhow!("Failed to load scraper config: {}", e))?,
                None => ScraperConfig::default(),
            };
            if skip_missing {
                scraper_config.skip_missing = true;
            }

            info!("Scraping monsters from {}", scraper_config.index_url());
            let client = WikiClient::new(&scraper_config)?;
            let scraper = MonsterScraper::new(client, scraper_config);

            let echo = echo_progress(quiet, format);
            let monsters = scraper
                .scrape(count, |n, monster| {
                    if echo {
                        println!("Got #{:03}: {}", n, monster.summary()?);
                    }
                    Ok(())
                })
                .await?;

            emit(&monsters, format, database)?;
        }
    }

    info!("mr3 CLI finished");
    Ok(())
}
