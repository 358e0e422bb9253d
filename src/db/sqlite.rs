use sqlx::Connection as _;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Column as _, Executor, Row, Statement, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{Column, Completion, Connection, Connector, RowSink};
use crate::config::ConnectionParams;
use crate::error::{QueryError, Result};

/// Local SQLite file named by the database parameter. Host, port and
/// credentials are ignored.
pub struct SqliteConnector {
    runtime: Runtime,
    create_if_missing: bool,
}

impl SqliteConnector {
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| QueryError::Driver(e.to_string()))?;
        Ok(Self {
            runtime,
            create_if_missing: false,
        })
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

impl Connector for SqliteConnector {
    type Connection<'a> = SqliteConnection<'a>;

    fn protocol(&self) -> &'static str {
        "sqlite"
    }

    fn connect<'a>(&'a self, params: &ConnectionParams) -> Result<SqliteConnection<'a>> {
        let options = SqliteConnectOptions::new()
            .filename(&params.database)
            .create_if_missing(self.create_if_missing);
        let conn = self
            .runtime
            .block_on(sqlx::SqliteConnection::connect_with(&options))
            .map_err(|e| QueryError::connection(params.display_url(self.protocol()), e))?;

        Ok(SqliteConnection {
            runtime: &self.runtime,
            conn: Some(conn),
        })
    }
}

pub struct SqliteConnection<'a> {
    runtime: &'a Runtime,
    conn: Option<sqlx::SqliteConnection>,
}

impl Connection for SqliteConnection<'_> {
    fn execute(&mut self, sql: &str, sink: &mut dyn RowSink) -> Result<Completion> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| QueryError::execution("connection already closed"))?;

        let statement = self
            .runtime
            .block_on((&mut *conn).prepare(sql))
            .map_err(QueryError::execution)?;

        let columns: Vec<Column> = statement
            .columns()
            .iter()
            .map(|c| Column::new(c.name()))
            .collect();

        if columns.is_empty() {
            let done = self
                .runtime
                .block_on(sqlx::query(sql).execute(&mut *conn))
                .map_err(QueryError::execution)?;
            return Ok(Completion::Affected(Some(done.rows_affected())));
        }

        // Buffered; stepping sqlx's row stream needs `futures` combinators.
        let rows = self
            .runtime
            .block_on(statement.query().fetch_all(&mut *conn))
            .map_err(QueryError::execution)?;
        debug!("result set has {} columns", columns.len());
        sink.columns(&columns)?;

        let mut values = Vec::with_capacity(columns.len());
        for row in &rows {
            values.clear();
            values.extend((0..columns.len()).map(|idx| extract_sqlite_value(row, idx)));
            sink.row(&values)?;
        }

        Ok(Completion::Rows(rows.len() as u64))
    }
}

impl Drop for SqliteConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = self.runtime.block_on(conn.close()) {
                debug!("error closing sqlite connection: {e}");
            }
        }
    }
}

fn extract_sqlite_value(row: &SqliteRow, idx: usize) -> Option<String> {
    let value_ref = row.try_get_raw(idx).ok();

    if let Some(vr) = value_ref {
        if vr.is_null() {
            return None;
        }

        let type_info = vr.type_info().clone();
        let type_name = type_info.name();

        match type_name {
            "INTEGER" => {
                if let Ok(v) = row.try_get::<i64, _>(idx) {
                    return Some(v.to_string());
                }
            }
            "REAL" => {
                if let Ok(v) = row.try_get::<f64, _>(idx) {
                    return Some(v.to_string());
                }
            }
            "TEXT" => {
                if let Ok(v) = row.try_get::<String, _>(idx) {
                    return Some(v);
                }
            }
            "BLOB" => {
                if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
                    return Some(format!("0x{}", hex::encode(v)));
                }
            }
            "BOOLEAN" => {
                if let Ok(v) = row.try_get::<bool, _>(idx) {
                    return Some(v.to_string());
                }
            }
            "DATE" => {
                if let Ok(v) = row.try_get::<sqlx::types::chrono::NaiveDate, _>(idx) {
                    return Some(v.to_string());
                }
            }
            "DATETIME" | "TIMESTAMP" => {
                if let Ok(v) = row.try_get::<sqlx::types::chrono::NaiveDateTime, _>(idx) {
                    return Some(v.to_string());
                }
            }
            _ => {}
        }
    }

    row.try_get::<String, _>(idx)
        .or_else(|_| row.try_get::<i64, _>(idx).map(|v| v.to_string()))
        .or_else(|_| row.try_get::<f64, _>(idx).map(|v| v.to_string()))
        .or_else(|_| row.try_get::<bool, _>(idx).map(|v| v.to_string()))
        .or_else(|_| row.try_get::<Vec<u8>, _>(idx).map(|v| format!("0x{}", hex::encode(v))))
        .ok()
}
