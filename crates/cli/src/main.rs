//! sqlxx command-line tool.
//!
//! Previews the column names the snake_case mapper assigns to struct fields,
//! runs named queries against a SQLite database, and generates / validates
//! configuration files.

mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use rusqlite::types::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sqlxx::config::AppConfig;
use sqlxx::db::{Args, Database, RawRow};
use sqlxx::naming::{to_snake, validate_identifier};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// sqlxx command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "sqlxx",
    version,
    about = "Run named SQLite queries and preview snake_case column mapping"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./sqlxx.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the
    /// configured `[logging] level`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the column name each identifier maps to.
    Snake {
        /// Identifiers to convert, e.g. `userID` or `SomeIDOfEntity`.
        #[arg(required = true)]
        identifiers: Vec<String>,

        /// Reject identifiers that are not plain ASCII letters, digits and `_`.
        #[arg(long)]
        strict: bool,
    },

    /// Run a query with `:name` placeholders and print the rows.
    Query {
        /// SQL text, e.g. `SELECT * FROM users WHERE user_id IN (:user_ids)`.
        sql: String,

        /// Bind a single value: `--arg userID=42`.
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,

        /// Bind a comma-separated list for `IN (...)`: `--list userIds=1,2,3`.
        #[arg(long = "list", value_parser = parse_key_value)]
        lists: Vec<(String, String)>,

        /// Database file to use instead of the configured one.
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Print rows as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./sqlxx.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(log_level(&cli)).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Snake {
            identifiers,
            strict,
        } => cmd_snake(&identifiers, strict),
        Commands::Query {
            sql,
            args,
            lists,
            database,
            json,
        } => {
            let db = match database {
                Some(path) => Database::new(&path)
                    .with_context(|| format!("failed to open database {}", path.display()))?,
                None => open_database(&cli.config)?,
            };
            cmd_query(&db, &sql, build_args(&args, &lists), json)
        }
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(&cli.config),
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config =
        AppConfig::load_from_file(path).context("failed to load configuration file")?;
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    config.validate().context("configuration validation failed")?;
    Ok(config)
}

/// The `--log-level` flag, else the configured level for `query`, else
/// `warn`.
fn log_level(cli: &Cli) -> String {
    if let Some(level) = &cli.log_level {
        return level.clone();
    }
    match cli.command {
        Commands::Query { .. } => AppConfig::load_from_file(&cli.config)
            .map(|config| config.logging.level)
            .unwrap_or_else(|_| "warn".to_string()),
        _ => "warn".to_string(),
    }
}

fn open_database(config_path: &Path) -> Result<Database> {
    let config = load_config(config_path)?;
    Database::from_config(&config.database).context("failed to open database")
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

/// Parse `name=value`.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

/// Interpret a command-line string as the most specific SQLite value:
/// `null`, an integer, a real, or text.
fn parse_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if raw.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Real(f);
        }
    }
    Value::Text(raw.to_string())
}

fn build_args(args: &[(String, String)], lists: &[(String, String)]) -> Args {
    let mut bound = Args::new();
    for (name, value) in args {
        bound = bound.bind(name.as_str(), parse_value(value));
    }
    for (name, values) in lists {
        let items = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(parse_value);
        bound = bound.bind_list(name.as_str(), items);
    }
    bound
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_snake(identifiers: &[String], strict: bool) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Column"]);

    for ident in identifiers {
        if strict {
            validate_identifier(ident)
                .with_context(|| format!("invalid identifier '{}'", ident))?;
        }
        table.add_row(vec![Cell::new(ident), Cell::new(to_snake(ident))]);
    }

    println!("{}", table);
    Ok(())
}

fn cmd_query(db: &Database, sql: &str, args: Args, json: bool) -> Result<()> {
    let (sql, values) = db
        .named_in(sql, &args)
        .context("failed to bind query arguments")?;
    debug!(sql = %sql, args = values.len(), "running query");

    let rows: Vec<RawRow> = db.select(&sql, &values).context("query failed")?;

    if json {
        println!("{}", output::rows_to_json(&rows)?);
    } else if rows.is_empty() {
        println!("No rows.");
    } else {
        println!("{}", output::rows_to_table(&rows));
        println!("{} row(s)", rows.len());
    }
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# sqlxx configuration

[database]
path = "sqlxx.db"
# path_env = "SQLXX_DATABASE"
busy_timeout_ms = 5000
journal_mode = "wal"
foreign_keys = true

[logging]
level = "info"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!(
        "Validate with: sqlxx validate --config {}",
        output.display()
    );
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    let _ = config.resolve_env_vars();
    println!("  [OK] Environment variable references processed");

    match config.validate() {
        Ok(()) => println!("  [OK] All fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Database      : {}", config.database.path.display());
    println!("  Journal mode  : {}", config.database.journal_mode.as_str());
    println!("  Busy timeout  : {} ms", config.database.busy_timeout_ms);
    println!("  Foreign keys  : {}", config.database.foreign_keys);
    println!("  Log level     : {}", config.logging.level);
    Ok(())
}
