//! Result set serialization to stdout.

use std::io::Write;

use clap::ValueEnum;
use serde_json::{Map, Value as JsonValue};

use crate::db::{Column, RowSink};
use crate::error::{QueryError, Result};

pub const DEFAULT_NULL_TEXT: &str = "NULL";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated with a header line
    Tsv,
    /// Comma-separated rows, no header
    Csv,
    /// JSON array of objects keyed by column name
    Json,
}

/// Renders rows in the order the backend hands them over. The ODBC backend
/// streams from its cursor; the sqlite backend passes a buffered result.
pub struct ResultWriter<W: Write> {
    out: W,
    format: OutputFormat,
    null_text: String,
    columns: Vec<String>,
    started: bool,
    rows: u64,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            null_text: DEFAULT_NULL_TEXT.to_string(),
            columns: Vec::new(),
            started: false,
            rows: 0,
        }
    }

    pub fn null_text(mut self, text: impl Into<String>) -> Self {
        self.null_text = text.into();
        self
    }

    /// Closes the JSON array if one was opened and flushes. A statement that
    /// produced no result set leaves the output empty in every format.
    pub fn finish(mut self) -> Result<W> {
        if self.started && self.format == OutputFormat::Json {
            self.out.write_all(b"]\n")?;
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_delimited(&mut self, values: &[Option<String>], delimiter: &str) -> Result<()> {
        let line = values
            .iter()
            .map(|v| v.as_deref().unwrap_or(&self.null_text))
            .collect::<Vec<_>>()
            .join(delimiter);
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn write_json_object(&mut self, values: &[Option<String>]) -> Result<()> {
        let object: Map<String, JsonValue> = self
            .columns
            .iter()
            .zip(values)
            .map(|(name, value)| {
                let value = value
                    .as_ref()
                    .map_or(JsonValue::Null, |v| JsonValue::String(v.clone()));
                (name.clone(), value)
            })
            .collect();

        if self.rows > 0 {
            self.out.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.out, &object)?;
        Ok(())
    }
}

impl<W: Write> RowSink for ResultWriter<W> {
    fn columns(&mut self, columns: &[Column]) -> Result<()> {
        self.columns = columns.iter().map(|c| c.name.clone()).collect();
        self.started = true;

        match self.format {
            OutputFormat::Tsv => {
                let header = self.columns.join("\t");
                self.out.write_all(header.as_bytes())?;
                self.out.write_all(b"\n")?;
            }
            OutputFormat::Csv => {}
            OutputFormat::Json => self.out.write_all(b"[")?,
        }
        Ok(())
    }

    fn row(&mut self, values: &[Option<String>]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(QueryError::Output(format!(
                "row has {} values but the result set has {} columns",
                values.len(),
                self.columns.len()
            )));
        }

        match self.format {
            OutputFormat::Tsv => self.write_delimited(values, "\t")?,
            OutputFormat::Csv => self.write_delimited(values, ",")?,
            OutputFormat::Json => self.write_json_object(values)?,
        }
        self.rows += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn render(format: OutputFormat, rows: &[Vec<Option<&str>>]) -> String {
        let mut writer = ResultWriter::new(Vec::new(), format);
        writer.columns(&[Column::new("a"), Column::new("b")]).unwrap();
        for row in rows {
            let values: Vec<Option<String>> =
                row.iter().map(|v| v.map(str::to_string)).collect();
            writer.row(&values).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_tsv_has_header() {
        let out = render(OutputFormat::Tsv, &[vec![Some("1"), Some("2")]]);
        assert_eq!(out, "a\tb\n1\t2\n");
    }

    #[test]
    fn test_csv_has_no_header() {
        let out = render(
            OutputFormat::Csv,
            &[vec![Some("1"), Some("2")], vec![Some("3"), None]],
        );
        assert_eq!(out, "1,2\n3,NULL\n");
    }

    #[test]
    fn test_json_rows() {
        let out = render(
            OutputFormat::Json,
            &[vec![Some("1"), None], vec![Some("x"), Some("y")]],
        );
        assert_eq!(out, "[{\"a\":\"1\",\"b\":null},{\"a\":\"x\",\"b\":\"y\"}]\n");
    }

    #[test]
    fn test_empty_result_set() {
        assert_eq!(render(OutputFormat::Tsv, &[]), "a\tb\n");
        assert_eq!(render(OutputFormat::Csv, &[]), "");
        assert_eq!(render(OutputFormat::Json, &[]), "[]\n");
    }

    #[test]
    fn test_custom_null_text() {
        let mut writer = ResultWriter::new(Vec::new(), OutputFormat::Tsv).null_text("");
        writer.columns(&[Column::new("x"), Column::new("y")]).unwrap();
        writer.row(&[None, Some("v".into())]).unwrap();
        assert_eq!(String::from_utf8(writer.finish().unwrap()).unwrap(), "x\ty\n\tv\n");
    }

    #[test]
    fn test_row_width_mismatch() {
        let mut writer = ResultWriter::new(Vec::new(), OutputFormat::Csv);
        writer.columns(&[Column::new("a")]).unwrap();
        let err = writer.row(&[Some("1".into()), Some("2".into())]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Output);
        assert!(writer.finish().unwrap().is_empty());
    }

    #[test]
    fn test_no_result_set_prints_nothing() {
        let writer = ResultWriter::new(Vec::new(), OutputFormat::Json);
        assert!(writer.finish().unwrap().is_empty());
    }
}
