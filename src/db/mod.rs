mod odbc;
mod sqlite;

pub use odbc::{OdbcConnection, OdbcConnector, OdbcOptions};
pub use sqlite::{SqliteConnection, SqliteConnector};

use crate::config::ConnectionParams;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// How a statement finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// A result set was streamed to the sink.
    Rows(u64),
    /// No result set; affected-row count if the driver reports one.
    Affected(Option<u64>),
}

/// Receives a result set in cursor order.
///
/// `columns` is called once, before any row. `row` is called once per row
/// with exactly `columns.len()` values, `None` standing for SQL NULL.
pub trait RowSink {
    fn columns(&mut self, columns: &[Column]) -> Result<()>;
    fn row(&mut self, values: &[Option<String>]) -> Result<()>;
}

/// An open session with the database.
///
/// Dropping the connection closes it. Statement and cursor handles live only
/// for the duration of `execute`, so they are released even when the sink
/// fails partway through.
pub trait Connection {
    fn execute(&mut self, sql: &str, sink: &mut dyn RowSink) -> Result<Completion>;
}

/// A loaded driver able to open connections.
pub trait Connector {
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// Protocol name used in the display URL.
    fn protocol(&self) -> &'static str;

    fn connect<'a>(&'a self, params: &ConnectionParams) -> Result<Self::Connection<'a>>;
}
