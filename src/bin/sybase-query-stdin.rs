//! `sybase-query-stdin <host> <port> <database> <username> <password> < query.sql`
//!
//! Reads the query from stdin and prints comma-separated rows without a header.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use sybase_query::cli::{self, DriverArgs, OutputArgs, PositionalConnection};
use sybase_query::query::{ensure_read_only, read_joined_lines};
use sybase_query::{ConnectionParams, OutputFormat, ResultWriter, run_with_driver};

#[derive(Parser, Debug)]
#[command(name = "sybase-query-stdin", version)]
#[command(about = "Run SQL read from stdin against Sybase and print comma-separated rows")]
struct Cli {
    #[command(flatten)]
    connection: PositionalConnection,

    #[command(flatten)]
    driver: DriverArgs,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> ExitCode {
    let cli: Cli = cli::parse_args();
    cli::init_logging("warn");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => cli::report_failure(&err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let sql = read_joined_lines(io::stdin().lock())?;
    if cli.output.read_only {
        ensure_read_only(&sql)?;
    }

    let params = ConnectionParams::from(cli.connection);
    let format = cli.output.format.unwrap_or(OutputFormat::Csv);
    let mut writer = ResultWriter::new(io::BufWriter::new(io::stdout().lock()), format)
        .null_text(cli.output.null_text);

    run_with_driver(cli.driver.driver, cli.driver.odbc_options(), &params, &sql, &mut writer)?;
    writer.finish()?;
    Ok(())
}
