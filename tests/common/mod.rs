//! In-memory connector standing in for a real driver.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use sybase_query::ConnectionParams;
use sybase_query::db::{Column, Completion, Connection, Connector, RowSink};
use sybase_query::{QueryError, Result};

#[derive(Clone)]
pub enum Canned {
    Rows {
        columns: Vec<&'static str>,
        rows: Vec<Vec<Option<&'static str>>>,
    },
    Affected(u64),
    Fail(&'static str),
}

pub struct MockConnector {
    pub response: Canned,
    pub refuse_connections: bool,
    pub closed: Rc<Cell<bool>>,
    pub executed: Rc<std::cell::RefCell<Vec<String>>>,
}

impl MockConnector {
    pub fn new(response: Canned) -> Self {
        Self {
            response,
            refuse_connections: false,
            closed: Rc::new(Cell::new(false)),
            executed: Rc::default(),
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse_connections: true,
            ..Self::new(Canned::Affected(0))
        }
    }
}

pub struct MockConnection<'a> {
    connector: &'a MockConnector,
}

impl Connector for MockConnector {
    type Connection<'a> = MockConnection<'a>;

    fn protocol(&self) -> &'static str {
        "mock"
    }

    fn connect<'a>(&'a self, params: &ConnectionParams) -> Result<MockConnection<'a>> {
        if self.refuse_connections {
            return Err(QueryError::connection(
                params.display_url(self.protocol()),
                "Network error IOException: Connection refused",
            ));
        }
        Ok(MockConnection { connector: self })
    }
}

impl Connection for MockConnection<'_> {
    fn execute(&mut self, sql: &str, sink: &mut dyn RowSink) -> Result<Completion> {
        self.connector.executed.borrow_mut().push(sql.to_string());
        match &self.connector.response {
            Canned::Rows { columns, rows } => {
                let columns: Vec<Column> = columns.iter().map(|c| Column::new(*c)).collect();
                sink.columns(&columns)?;
                for row in rows {
                    let values: Vec<Option<String>> =
                        row.iter().map(|v| v.map(str::to_string)).collect();
                    sink.row(&values)?;
                }
                Ok(Completion::Rows(rows.len() as u64))
            }
            Canned::Affected(n) => Ok(Completion::Affected(Some(*n))),
            Canned::Fail(message) => Err(QueryError::execution(message)),
        }
    }
}

impl Drop for MockConnection<'_> {
    fn drop(&mut self) {
        self.connector.closed.set(true);
    }
}

pub fn params() -> ConnectionParams {
    ConnectionParams {
        host: "db01".into(),
        port: 5000,
        database: "sales".into(),
        username: "sa".into(),
        password: "secret".into(),
    }
}
