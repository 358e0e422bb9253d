//! Schema browsing for Sybase: tables, table definitions, the full schema and
//! stored procedure calls, printed as JSON by default.
//!
//! Connection settings come from flags or `SYBASE_HOST`, `SYBASE_PORT`,
//! `SYBASE_DATABASE`, `SYBASE_USERNAME` and `SYBASE_PASSWORD`, optionally
//! loaded from `.env`.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use sybase_query::catalog;
use sybase_query::cli::{self, DriverArgs};
use sybase_query::output::DEFAULT_NULL_TEXT;
use sybase_query::query::ensure_read_only;
use sybase_query::{ConnectionParams, OutputFormat, QueryError, ResultWriter, run_with_driver};

#[derive(Parser, Debug)]
#[command(name = "sybase-catalog", version)]
#[command(about = "Inspect a Sybase database schema")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionOptions,

    #[command(flatten)]
    driver: DriverArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    format: OutputFormat,

    /// Text printed for NULL values in tsv/csv output
    #[arg(long, default_value = DEFAULT_NULL_TEXT, global = true)]
    null_text: String,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConnectionOptions {
    #[arg(long, env = "SYBASE_HOST")]
    host: Option<String>,

    #[arg(long, env = "SYBASE_PORT")]
    port: Option<u16>,

    #[arg(long, env = "SYBASE_DATABASE")]
    database: Option<String>,

    #[arg(long, env = "SYBASE_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "SYBASE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl ConnectionOptions {
    fn into_params(self) -> sybase_query::Result<ConnectionParams> {
        fn required<T>(value: Option<T>, flag: &str, var: &str) -> sybase_query::Result<T> {
            value.ok_or_else(|| QueryError::Usage(format!("missing --{flag} (or {var})")))
        }

        Ok(ConnectionParams {
            host: required(self.host, "host", "SYBASE_HOST")?,
            port: required(self.port, "port", "SYBASE_PORT")?,
            database: required(self.database, "database", "SYBASE_DATABASE")?,
            username: required(self.username, "username", "SYBASE_USERNAME")?,
            password: required(self.password, "password", "SYBASE_PASSWORD")?,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List user tables with their owners
    Tables,

    /// Show column names, types and lengths of a user table
    Describe {
        table: String,
    },

    /// Dump tables, views and procedures with their columns
    Schema,

    /// Execute a stored procedure
    Exec {
        procedure: String,

        /// Procedure arguments; numbers are passed verbatim, anything else quoted
        #[arg(allow_hyphen_values = true)]
        params: Vec<String>,
    },

    /// Run a single read-only SELECT
    Query {
        sql: String,
    },
}

impl Command {
    fn sql(&self) -> sybase_query::Result<String> {
        match self {
            Self::Tables => Ok(catalog::list_tables_sql()),
            Self::Describe { table } => catalog::describe_table_sql(table),
            Self::Schema => Ok(catalog::database_schema_sql()),
            Self::Exec { procedure, params } => catalog::exec_procedure_sql(procedure, params),
            Self::Query { sql } => {
                ensure_read_only(sql)?;
                Ok(sql.clone())
            }
        }
    }
}

fn main() -> ExitCode {
    // Must run before parsing so that env fallbacks see the loaded values.
    let env_files = sybase_query::config::load_env_files();

    let cli: Cli = cli::parse_args();
    cli::init_logging(&cli.log_level);
    for path in &env_files {
        debug!("loaded environment from {}", path.display());
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => cli::report_failure(&err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let sql = cli.command.sql()?;
    debug!("catalog query: {sql}");

    let params = cli.connection.into_params()?;
    let mut writer = ResultWriter::new(io::BufWriter::new(io::stdout().lock()), cli.format)
        .null_text(cli.null_text);

    run_with_driver(cli.driver.driver, cli.driver.odbc_options(), &params, &sql, &mut writer)?;
    writer.finish()?;
    Ok(())
}
