//! `sybase-query <host> <port> <database> <username> <password> <base64-query>`
//!
//! Prints the result set tab-separated with a header line.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use sybase_query::cli::{self, DriverArgs, OutputArgs, PositionalConnection};
use sybase_query::query::{decode_base64_query, ensure_read_only};
use sybase_query::{ConnectionParams, OutputFormat, ResultWriter, run_with_driver};

#[derive(Parser, Debug)]
#[command(name = "sybase-query", version)]
#[command(about = "Run a base64-encoded SQL query against Sybase and print tab-separated results")]
struct Cli {
    #[command(flatten)]
    connection: PositionalConnection,

    /// SQL text, base64-encoded
    query: String,

    #[command(flatten)]
    driver: DriverArgs,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> ExitCode {
    let cli: Cli = cli::parse_args();
    cli::init_logging("debug");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => cli::report_failure(&err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let sql = decode_base64_query(&cli.query)?;
    debug!("decoded query ({} bytes)", sql.len());
    if cli.output.read_only {
        ensure_read_only(&sql)?;
    }

    let params = ConnectionParams::from(cli.connection);
    let format = cli.output.format.unwrap_or(OutputFormat::Tsv);
    let mut writer = ResultWriter::new(io::BufWriter::new(io::stdout().lock()), format)
        .null_text(cli.output.null_text);

    run_with_driver(cli.driver.driver, cli.driver.odbc_options(), &params, &sql, &mut writer)?;
    writer.finish()?;
    Ok(())
}
