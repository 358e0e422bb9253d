//! Run one SQL query against Sybase and print the result set as text.
//!
//! The pipeline is linear: acquire the query text, load a driver, open a
//! connection, execute, stream rows into a [`db::RowSink`], release. The
//! driver is passed in as a [`db::Connector`]; nothing is registered
//! process-wide.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod query;
pub mod runner;

pub use config::ConnectionParams;
pub use error::{ErrorKind, QueryError, Result};
pub use output::{OutputFormat, ResultWriter};
pub use runner::{Driver, run_query, run_with_driver};
