use clap::ValueEnum;
use tracing::{debug, info};

use crate::config::ConnectionParams;
use crate::db::{
    Completion, Connection, Connector, OdbcConnector, OdbcOptions, RowSink, SqliteConnector,
};
use crate::error::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Driver {
    /// Sybase ASE through the ODBC driver manager
    #[default]
    Odbc,
    /// Local SQLite file named by the database argument
    Sqlite,
}

/// Opens one connection, executes `sql` once and streams the result into
/// `sink`. The connection is dropped before returning, on success or error.
pub fn run_query<C: Connector>(
    connector: &C,
    params: &ConnectionParams,
    sql: &str,
    sink: &mut dyn RowSink,
) -> Result<Completion> {
    debug!("connecting to {}", params.display_url(connector.protocol()));
    let mut connection = connector.connect(params)?;

    debug!("connected, executing query");
    let completion = connection.execute(sql, sink)?;
    match completion {
        Completion::Rows(n) => debug!("query complete, {n} rows"),
        Completion::Affected(Some(n)) => {
            info!("statement returned no result set, {n} rows affected")
        }
        Completion::Affected(None) => info!("statement returned no result set"),
    }

    drop(connection);
    debug!("connection closed");
    Ok(completion)
}

/// Loads the selected driver and runs the query through it.
pub fn run_with_driver(
    driver: Driver,
    odbc: OdbcOptions,
    params: &ConnectionParams,
    sql: &str,
    sink: &mut dyn RowSink,
) -> Result<Completion> {
    match driver {
        Driver::Odbc => {
            debug!("loading ODBC driver manager (driver {})", odbc.driver);
            let connector = OdbcConnector::new(odbc)?;
            run_query(&connector, params, sql, sink)
        }
        Driver::Sqlite => {
            debug!("loading SQLite driver");
            let connector = SqliteConnector::new()?;
            run_query(&connector, params, sql, sink)
        }
    }
}
