//! Argument groups and process plumbing shared by the binaries.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::{Args, Parser};
use tracing_subscriber::EnvFilter;

use crate::config::ConnectionParams;
use crate::db::OdbcOptions;
use crate::output::{DEFAULT_NULL_TEXT, OutputFormat};
use crate::runner::Driver;

/// Connection parameters in their fixed positional order.
#[derive(Args, Debug)]
pub struct PositionalConnection {
    /// Server host name or address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Database name (file path with --driver sqlite)
    pub database: String,

    pub username: String,

    #[arg(allow_hyphen_values = true)]
    pub password: String,
}

impl From<PositionalConnection> for ConnectionParams {
    fn from(args: PositionalConnection) -> Self {
        Self {
            host: args.host,
            port: args.port,
            database: args.database,
            username: args.username,
            password: args.password,
        }
    }
}

#[derive(Args, Debug)]
pub struct DriverArgs {
    /// Database driver
    #[arg(long, value_enum, default_value_t = Driver::Odbc)]
    pub driver: Driver,

    /// ODBC driver name as registered in odbcinst.ini
    #[arg(long, env = "SYBASE_ODBC_DRIVER", default_value = "FreeTDS")]
    pub odbc_driver: String,

    /// TDS protocol version passed to the ODBC driver
    #[arg(long, default_value = "5.0")]
    pub tds_version: String,

    /// Login timeout in seconds (no timeout when omitted)
    #[arg(long, value_name = "SECONDS")]
    pub login_timeout: Option<u32>,
}

impl DriverArgs {
    pub fn odbc_options(&self) -> OdbcOptions {
        OdbcOptions {
            driver: self.odbc_driver.clone(),
            tds_version: self.tds_version.clone(),
            login_timeout_sec: self.login_timeout,
        }
    }
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output format (defaults to the binary's native format)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Text printed for NULL values in tsv/csv output
    #[arg(long, default_value = DEFAULT_NULL_TEXT)]
    pub null_text: String,

    /// Refuse anything but a single SELECT statement
    #[arg(long)]
    pub read_only: bool,
}

/// Parses arguments, exiting with status 1 on usage errors. Help and
/// version requests keep clap's own behaviour.
pub fn parse_args<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(err) if err.use_stderr() => {
            // Printing to stderr can only fail if stderr is gone.
            let _ = err.print();
            std::process::exit(1);
        }
        Err(err) => err.exit(),
    }
}

/// stderr logging; `RUST_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

pub fn report_failure(err: &anyhow::Error) -> ExitCode {
    eprintln!("Error: {err:#}");
    ExitCode::FAILURE
}
