//! Canned metadata queries against the Sybase system tables.

use crate::error::Result;
use crate::query::{sql_literal, validate_identifier, validate_qualified_identifier};

pub fn list_tables_sql() -> String {
    "SELECT u.name AS owner, o.name AS table_name \
     FROM sysobjects o \
     JOIN sysusers u ON o.uid = u.uid \
     WHERE o.type = 'U' \
     ORDER BY owner, table_name"
        .to_string()
}

/// Column name, type and length of a user table.
pub fn describe_table_sql(table: &str) -> Result<String> {
    validate_identifier(table)?;
    Ok(format!(
        "SELECT c.name AS column_name, t.name AS data_type, c.length \
         FROM syscolumns c \
         JOIN systypes t ON c.usertype = t.usertype \
         JOIN sysobjects o ON c.id = o.id \
         WHERE o.name = '{table}' AND o.type = 'U'"
    ))
}

/// User tables, views and stored procedures with their columns.
pub fn database_schema_sql() -> String {
    "SELECT o.name AS object_name, o.type AS object_type, u.name AS owner_name, \
            c.name AS column_name, t.name AS data_type, c.length AS column_length, \
            c.prec AS precision, c.scale AS scale, c.status AS column_status \
     FROM sysobjects o \
     JOIN sysusers u ON o.uid = u.uid \
     LEFT JOIN syscolumns c ON o.id = c.id \
     LEFT JOIN systypes t ON c.usertype = t.usertype \
     WHERE o.type IN ('U', 'V', 'P') \
     ORDER BY object_type, object_name, column_name"
        .to_string()
}

pub fn exec_procedure_sql(procedure: &str, params: &[String]) -> Result<String> {
    validate_qualified_identifier(procedure)?;
    let mut sql = format!("EXEC {procedure}");
    if !params.is_empty() {
        let args: Vec<String> = params.iter().map(|p| sql_literal(p)).collect();
        sql.push(' ');
        sql.push_str(&args.join(", "));
    }
    Ok(sql)
}
