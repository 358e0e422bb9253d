use std::borrow::Cow;

use chrono::{NaiveDate, NaiveTime};
use odbc_api::handles::{AsStatementRef, SqlResult, Statement, StatementRef};
use odbc_api::sys::{Date, Time, Timestamp};
use odbc_api::{
    ConnectionOptions, Cursor, CursorImpl, DataType, Environment, Nullable,
};
use tracing::debug;

use super::{Column, Completion, Connection, Connector, RowSink};
use crate::config::ConnectionParams;
use crate::error::{QueryError, Result};

/// Settings for the ODBC route to Sybase ASE.
#[derive(Clone, Debug)]
pub struct OdbcOptions {
    /// Driver name as registered with the driver manager (odbcinst.ini).
    pub driver: String,
    pub tds_version: String,
    pub login_timeout_sec: Option<u32>,
}

impl Default for OdbcOptions {
    fn default() -> Self {
        Self {
            driver: "FreeTDS".to_string(),
            tds_version: "5.0".to_string(),
            login_timeout_sec: None,
        }
    }
}

pub struct OdbcConnector {
    environment: Environment,
    options: OdbcOptions,
}

impl OdbcConnector {
    /// Loads the ODBC driver manager.
    pub fn new(options: OdbcOptions) -> Result<Self> {
        let environment = Environment::new().map_err(|e| QueryError::Driver(e.to_string()))?;
        Ok(Self {
            environment,
            options,
        })
    }

    pub fn connection_string(&self, params: &ConnectionParams) -> String {
        connection_string(&self.options, params)
    }
}

impl Connector for OdbcConnector {
    type Connection<'a> = OdbcConnection<'a>;

    fn protocol(&self) -> &'static str {
        "sybase"
    }

    fn connect<'a>(&'a self, params: &ConnectionParams) -> Result<OdbcConnection<'a>> {
        let options = ConnectionOptions {
            login_timeout_sec: self.options.login_timeout_sec,
            ..Default::default()
        };
        let connection = self
            .environment
            .connect_with_connection_string(&self.connection_string(params), options)
            .map_err(|e| QueryError::connection(params.display_url(self.protocol()), e))?;

        Ok(OdbcConnection { connection })
    }
}

pub struct OdbcConnection<'env> {
    connection: odbc_api::Connection<'env>,
}

impl Connection for OdbcConnection<'_> {
    fn execute(&mut self, sql: &str, sink: &mut dyn RowSink) -> Result<Completion> {
        let mut statement = self.connection.preallocate().map_err(QueryError::execution)?;

        let streamed = match statement.execute(sql, ()).map_err(QueryError::execution)? {
            Some(mut cursor) => Some(stream_cursor(&mut cursor, sink)?),
            None => None,
        };
        if let Some(rows) = streamed {
            return Ok(Completion::Rows(rows));
        }

        // The batch may open with update counts (DML before a SELECT, or a
        // procedure without SET NOCOUNT ON). Skip them up to the first result set.
        let mut results = StatementResults(statement.as_stmt_ref());
        match seek_result_set(&mut results)? {
            Seek::ResultSet => {
                // SAFETY: the statement is positioned on a result with columns and
                // no buffers are bound to it.
                let mut cursor = unsafe { CursorImpl::new(results.0) };
                Ok(Completion::Rows(stream_cursor(&mut cursor, sink)?))
            }
            Seek::Exhausted(affected) => Ok(Completion::Affected(affected)),
        }
    }
}

/// The results of an executed batch, in server order.
trait ResultSequence {
    fn column_count(&mut self) -> Result<i16>;

    /// Rows affected by the current result, if the driver knows.
    fn affected_rows(&mut self) -> Result<Option<u64>>;

    /// Moves to the next result; `false` once there are none left.
    fn advance(&mut self) -> Result<bool>;
}

#[derive(Debug, PartialEq, Eq)]
enum Seek {
    ResultSet,
    /// No result set in the batch; summed update counts.
    Exhausted(Option<u64>),
}

/// Starting on a result without columns, advances until a result set is found
/// or the batch runs out.
fn seek_result_set(results: &mut impl ResultSequence) -> Result<Seek> {
    let mut affected = results.affected_rows()?;
    while results.advance()? {
        if results.column_count()? > 0 {
            return Ok(Seek::ResultSet);
        }
        if let Some(n) = results.affected_rows()? {
            affected = Some(affected.unwrap_or(0) + n);
        }
    }
    Ok(Seek::Exhausted(affected))
}

struct StatementResults<'s>(StatementRef<'s>);

impl ResultSequence for StatementResults<'_> {
    fn column_count(&mut self) -> Result<i16> {
        sql_result(self.0.num_result_cols(), "SQLNumResultCols")?
            .ok_or_else(|| QueryError::execution("SQLNumResultCols returned no data"))
    }

    fn affected_rows(&mut self) -> Result<Option<u64>> {
        let count = sql_result(self.0.row_count(), "SQLRowCount")?;
        Ok(count.and_then(|n| u64::try_from(n).ok()))
    }

    fn advance(&mut self) -> Result<bool> {
        // SAFETY: no buffers are bound while skipping update counts.
        let more = unsafe { self.0.more_results() };
        Ok(sql_result(more, "SQLMoreResults")?.is_some())
    }
}

fn sql_result<T>(result: SqlResult<T>, function: &str) -> Result<Option<T>> {
    match result {
        SqlResult::Success(value) | SqlResult::SuccessWithInfo(value) => Ok(Some(value)),
        SqlResult::NoData => Ok(None),
        _ => Err(QueryError::execution(format!("{function} failed"))),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueKind {
    Text,
    Binary,
    Date,
    Time,
    Timestamp,
}

impl From<DataType> for ValueKind {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Binary { .. }
            | DataType::Varbinary { .. }
            | DataType::LongVarbinary { .. } => Self::Binary,
            DataType::Date => Self::Date,
            DataType::Time { .. } => Self::Time,
            DataType::Timestamp { .. } => Self::Timestamp,
            _ => Self::Text,
        }
    }
}

fn result_columns(reported: i16) -> Result<u16> {
    u16::try_from(reported)
        .map_err(|_| QueryError::execution(format!("driver reported {reported} result columns")))
}

fn stream_cursor(cursor: &mut impl Cursor, sink: &mut dyn RowSink) -> Result<u64> {
    let column_count = result_columns(cursor.num_result_cols().map_err(QueryError::execution)?)?;

    let mut columns = Vec::with_capacity(usize::from(column_count));
    let mut kinds = Vec::with_capacity(usize::from(column_count));
    for index in 1..=column_count {
        columns.push(Column::new(cursor.col_name(index).map_err(QueryError::execution)?));
        kinds.push(ValueKind::from(
            cursor.col_data_type(index).map_err(QueryError::execution)?,
        ));
    }
    debug!("result set has {} columns", columns.len());
    sink.columns(&columns)?;

    let mut buf = Vec::new();
    let mut values = Vec::with_capacity(kinds.len());
    let mut count = 0u64;
    while let Some(mut row) = cursor.next_row().map_err(QueryError::execution)? {
        values.clear();
        for (index, kind) in (1..=column_count).zip(kinds.iter().copied()) {
            let value = match kind {
                ValueKind::Text => row
                    .get_text(index, &mut buf)
                    .map_err(QueryError::execution)?
                    .then(|| String::from_utf8_lossy(&buf).into_owned()),
                ValueKind::Binary => row
                    .get_binary(index, &mut buf)
                    .map_err(QueryError::execution)?
                    .then(|| format!("0x{}", hex::encode(&buf))),
                ValueKind::Date => {
                    let mut date = Nullable::<Date>::null();
                    row.get_data(index, &mut date).map_err(QueryError::execution)?;
                    date.as_opt().map(format_date)
                }
                ValueKind::Time => {
                    let mut time = Nullable::<Time>::null();
                    row.get_data(index, &mut time).map_err(QueryError::execution)?;
                    time.as_opt().map(format_time)
                }
                ValueKind::Timestamp => {
                    let mut timestamp = Nullable::<Timestamp>::null();
                    row.get_data(index, &mut timestamp)
                        .map_err(QueryError::execution)?;
                    timestamp.as_opt().map(format_timestamp)
                }
            };
            values.push(value);
        }
        sink.row(&values)?;
        count += 1;
    }

    Ok(count)
}

fn format_date(date: &Date) -> String {
    let year = i32::from(date.year);
    match NaiveDate::from_ymd_opt(year, u32::from(date.month), u32::from(date.day)) {
        Some(d) => d.to_string(),
        None => format!("{:04}-{:02}-{:02}", date.year, date.month, date.day),
    }
}

fn format_time(time: &Time) -> String {
    let (hour, minute) = (u32::from(time.hour), u32::from(time.minute));
    match NaiveTime::from_hms_opt(hour, minute, u32::from(time.second)) {
        Some(t) => t.to_string(),
        None => format!("{:02}:{:02}:{:02}", time.hour, time.minute, time.second),
    }
}

fn format_timestamp(ts: &Timestamp) -> String {
    NaiveDate::from_ymd_opt(i32::from(ts.year), u32::from(ts.month), u32::from(ts.day))
        .and_then(|d| {
            d.and_hms_nano_opt(
                u32::from(ts.hour),
                u32::from(ts.minute),
                u32::from(ts.second),
                ts.fraction,
            )
        })
        .map(|dt| dt.to_string())
        .unwrap_or_else(|| {
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second
            )
        })
}

fn connection_string(options: &OdbcOptions, params: &ConnectionParams) -> String {
    format!(
        "Driver={};Server={};Port={};Database={};UID={};PWD={};TDS_Version={};",
        braced(&options.driver),
        attribute(&params.host),
        params.port,
        attribute(&params.database),
        attribute(&params.username),
        attribute(&params.password),
        attribute(&options.tds_version),
    )
}

/// Brace-quotes an attribute value when the driver manager would otherwise
/// split or trim it.
fn attribute(value: &str) -> Cow<'_, str> {
    let needs_quoting = value.contains([';', '{', '}'])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_quoting {
        Cow::Owned(braced(value))
    } else {
        Cow::Borrowed(value)
    }
}

fn braced(value: &str) -> String {
    format!("{{{}}}", value.replace('}', "}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(password: &str) -> ConnectionParams {
        ConnectionParams {
            host: "db01".into(),
            port: 5000,
            database: "sales".into(),
            username: "sa".into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_connection_string() {
        let s = connection_string(&OdbcOptions::default(), &params("secret"));
        assert_eq!(
            s,
            "Driver={FreeTDS};Server=db01;Port=5000;Database=sales;UID=sa;PWD=secret;TDS_Version=5.0;"
        );
    }

    #[test]
    fn test_connection_string_quotes_special_values() {
        let s = connection_string(&OdbcOptions::default(), &params("a;b}c"));
        assert!(s.contains("PWD={a;b}}c};"), "{s}");

        let s = connection_string(&OdbcOptions::default(), &params(" padded"));
        assert!(s.contains("PWD={ padded};"), "{s}");
    }

    #[test]
    fn test_value_kind_from_data_type() {
        assert_eq!(ValueKind::from(DataType::Date), ValueKind::Date);
        assert_eq!(ValueKind::from(DataType::Integer), ValueKind::Text);
        assert_eq!(ValueKind::from(DataType::Unknown), ValueKind::Text);
    }

    /// Canned batch: `(column_count, affected_rows)` per result.
    struct FakeBatch {
        results: Vec<(i16, Option<u64>)>,
        position: usize,
    }

    impl FakeBatch {
        fn new(results: Vec<(i16, Option<u64>)>) -> Self {
            Self { results, position: 0 }
        }
    }

    impl ResultSequence for FakeBatch {
        fn column_count(&mut self) -> Result<i16> {
            Ok(self.results[self.position].0)
        }

        fn affected_rows(&mut self) -> Result<Option<u64>> {
            Ok(self.results[self.position].1)
        }

        fn advance(&mut self) -> Result<bool> {
            if self.position + 1 < self.results.len() {
                self.position += 1;
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }

    #[test]
    fn test_update_count_before_result_set() {
        // INSERT INTO t VALUES (1) SELECT * FROM t
        let mut batch = FakeBatch::new(vec![(0, Some(1)), (2, None)]);
        assert_eq!(seek_result_set(&mut batch).unwrap(), Seek::ResultSet);
        assert_eq!(batch.position, 1);
    }

    #[test]
    fn test_several_update_counts_then_result_set() {
        let mut batch = FakeBatch::new(vec![(0, Some(1)), (0, Some(3)), (1, None), (4, None)]);
        assert_eq!(seek_result_set(&mut batch).unwrap(), Seek::ResultSet);
        assert_eq!(batch.position, 2);
    }

    #[test]
    fn test_batch_without_result_set() {
        let mut batch = FakeBatch::new(vec![(0, Some(2)), (0, Some(5))]);
        assert_eq!(seek_result_set(&mut batch).unwrap(), Seek::Exhausted(Some(7)));

        let mut batch = FakeBatch::new(vec![(0, None)]);
        assert_eq!(seek_result_set(&mut batch).unwrap(), Seek::Exhausted(None));
    }

    #[test]
    fn test_negative_column_count_is_execution_error() {
        assert_eq!(result_columns(3).unwrap(), 3);
        let err = result_columns(-1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Execution);
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Timestamp {
            year: 2024,
            month: 1,
            day: 31,
            hour: 10,
            minute: 5,
            second: 9,
            fraction: 0,
        };
        assert_eq!(format_timestamp(&ts), "2024-01-31 10:05:09");

        let ts = Timestamp {
            fraction: 123_000_000,
            ..ts
        };
        assert_eq!(format_timestamp(&ts), "2024-01-31 10:05:09.123");
    }

    #[test]
    fn test_format_date_out_of_range() {
        let date = Date {
            year: 2024,
            month: 2,
            day: 30,
        };
        assert_eq!(format_date(&date), "2024-02-30");
    }
}
