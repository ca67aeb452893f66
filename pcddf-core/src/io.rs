//! Reading and writing keyed tables as CSV files.
//!
//! Files may start with a block of comment lines beginning with `#` (or `"#` when the
//! comment was quoted because it contains a comma).
//! The first non-comment line is the header, one column of which is the index.
//!
//! ```csv
//! # Profile model stage 1
//! "# ESP: partitioning, conc_in=58.966, conc_out=134.08"
//! Congener,Gas,Particulate
//! "2,3,7,8-TCDD",0.01,0.02
//! ```

use crate::errors::{PcddfError, PcddfResult};
use crate::table::Table;
use log::debug;
use std::fs;
use std::path::Path;

/// Reads CSV files into [`Table`]s indexed by a named column
#[derive(Debug, Clone)]
pub struct CsvReader {
    index_label: String,
}

impl CsvReader {
    pub fn new(index_label: &str) -> Self {
        Self {
            index_label: index_label.to_string(),
        }
    }

    /// Read a table from disk.
    ///
    /// Rows are returned in file order; reindexing to the canonical order is up to the caller.
    pub fn read_table(&self, path: &Path) -> PcddfResult<Table> {
        let contents = fs::read_to_string(path).map_err(|e| PcddfError::io(path, e))?;
        let table = self.parse(&contents, &path.display().to_string())?;
        debug!(
            "Read {} rows x {} columns from {}",
            table.len(),
            table.column_names().len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse the contents of a CSV file.
    ///
    /// `source` is only used to label the table in error messages.
    pub fn parse(&self, contents: &str, source: &str) -> PcddfResult<Table> {
        let body = skip_comment_lines(contents);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers = reader.headers()?.clone();
        let index_position = headers
            .iter()
            .position(|h| h == self.index_label)
            .ok_or_else(|| PcddfError::MissingIndex {
                expected: self.index_label.clone(),
                table: source.to_string(),
            })?;

        let names: Vec<(usize, &str)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index_position)
            .collect();

        let mut index = vec![];
        let mut values: Vec<Vec<f64>> = vec![vec![]; names.len()];
        for record in reader.records() {
            let record = record?;
            index.push(record[index_position].to_string());
            for (slot, (position, name)) in names.iter().enumerate() {
                values[slot].push(parse_value(&record[*position], name, source)?);
            }
        }

        let mut table = Table::new(&self.index_label, index).with_source(source);
        for ((_, name), column) in names.into_iter().zip(values) {
            table.insert_column(name, column.into());
        }
        Ok(table)
    }
}

/// Writes [`Table`]s to CSV files preceded by a block of comment lines
#[derive(Debug, Clone, Default)]
pub struct CsvWriter {
    comments: Vec<String>,
}

impl CsvWriter {
    pub fn new(comments: Vec<String>) -> Self {
        Self { comments }
    }

    /// Render a table as CSV text
    ///
    /// Absent values (`NaN`) are written as empty fields.
    pub fn to_csv_string(&self, table: &Table) -> PcddfResult<String> {
        let mut buffer: Vec<u8> = vec![];
        for comment in &self.comments {
            // A comment must stay on one line or the rest would be read as the header
            let comment = comment.replace(['\r', '\n'], " ");
            // The csv reader would otherwise split a comment containing a comma into fields
            let line = if comment.contains(',') {
                format!("\"# {}\"\n", comment)
            } else {
                format!("# {}\n", comment)
            };
            buffer.extend_from_slice(line.as_bytes());
        }

        {
            let mut writer = csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(&mut buffer);
            let mut header = vec![table.index_label().to_string()];
            header.extend(table.column_names().into_iter().map(String::from));
            writer.write_record(&header)?;

            let columns: Vec<_> = table.columns().collect();
            for (row, key) in table.index().iter().enumerate() {
                let mut record = vec![key.clone()];
                record.extend(columns.iter().map(|c| format_value(c.values[row])));
                writer.write_record(&record)?;
            }
            writer.flush().map_err(csv::Error::from)?;
        }

        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write a table to disk, replacing any existing file
    pub fn write_table(&self, table: &Table, path: &Path) -> PcddfResult<()> {
        let contents = self.to_csv_string(table)?;
        fs::write(path, contents).map_err(|e| PcddfError::io(path, e))?;
        debug!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }
}

/// Strip the leading block of comment lines
fn skip_comment_lines(contents: &str) -> &str {
    let mut offset = 0;
    for line in contents.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.starts_with("\"#") {
            offset += line.len();
        } else {
            break;
        }
    }
    &contents[offset..]
}

fn parse_value(field: &str, column: &str, source: &str) -> PcddfResult<f64> {
    if field.is_empty() || field.eq_ignore_ascii_case("nan") || field.eq_ignore_ascii_case("na")
    {
        return Ok(f64::NAN);
    }
    field.parse().map_err(|_| PcddfError::InvalidNumber {
        value: field.to_string(),
        column: column.to_string(),
        table: source.to_string(),
    })
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const EXAMPLE: &str = "# Initial profile\n\
\"# Source: stack sampling, 2019\"\n\
Congener,Gas,Particulate\n\
OCDD,0.01,0.2\n\
\"2,3,7,8-TCDD\",,0.05\n";

    #[test]
    fn test_skips_comment_block() {
        let body = skip_comment_lines(EXAMPLE);
        assert!(body.starts_with("Congener"));
    }

    #[test]
    fn test_parse_with_comments_and_missing_values() {
        let table = CsvReader::new("Congener").parse(EXAMPLE, "test").unwrap();

        assert_eq!(table.index(), &["OCDD".to_string(), "2,3,7,8-TCDD".to_string()]);
        assert_eq!(table.column_names(), vec!["Gas", "Particulate"]);
        assert_eq!(table.value("OCDD", "Gas"), Some(0.01));
        assert!(table.value("2,3,7,8-TCDD", "Gas").unwrap().is_nan());
        assert_eq!(table.value("2,3,7,8-TCDD", "Particulate"), Some(0.05));
    }

    #[test]
    fn test_index_column_need_not_be_first() {
        let contents = "a,Congener,b\n1.5,OCDF,2.5\n";
        let table = CsvReader::new("Congener").parse(contents, "test").unwrap();
        assert_eq!(table.index(), &["OCDF".to_string()]);
        assert_eq!(table.value("OCDF", "a"), Some(1.5));
        assert_eq!(table.value("OCDF", "b"), Some(2.5));
    }

    #[test]
    fn test_missing_index_column() {
        let err = CsvReader::new("Year").parse(EXAMPLE, "test").unwrap_err();
        assert!(matches!(err, PcddfError::MissingIndex { .. }));
    }

    #[test]
    fn test_invalid_number() {
        let contents = "Congener,Gas\nOCDD,lots\n";
        let err = CsvReader::new("Congener").parse(contents, "test").unwrap_err();
        assert!(matches!(err, PcddfError::InvalidNumber { .. }));
    }

    #[test]
    fn test_writes_quoted_comments_and_empty_nan() {
        let table = Table::new("Congener", vec!["OCDD".to_string(), "2,3,7,8-TCDD".to_string()])
            .with_column("Total", array![0.25, f64::NAN]);
        let writer = CsvWriter::new(vec![
            "Profile model".to_string(),
            "conc_in=1, conc_out=2".to_string(),
        ]);

        let text = writer.to_csv_string(&table).unwrap();
        assert_eq!(
            text,
            "# Profile model\n\
\"# conc_in=1, conc_out=2\"\n\
Congener,Total\n\
OCDD,0.25\n\
\"2,3,7,8-TCDD\",\n"
        );
    }

    #[test]
    fn test_multiline_comments_are_flattened() {
        let table =
            Table::new("Congener", vec!["OCDD".to_string()]).with_column("Total", array![0.5]);
        let writer = CsvWriter::new(vec![
            "Stage 1: WS\nline two (removal efficiency)".to_string(),
            "a\r\nb, c".to_string(),
        ]);

        let text = writer.to_csv_string(&table).unwrap();
        assert_eq!(
            text,
            "# Stage 1: WS line two (removal efficiency)\n\
\"# a  b, c\"\n\
Congener,Total\n\
OCDD,0.5\n"
        );

        let read = CsvReader::new("Congener").parse(&text, "test").unwrap();
        assert_eq!(read.index(), &["OCDD".to_string()]);
        assert_eq!(read.value("OCDD", "Total"), Some(0.5));
    }

    #[test]
    fn test_written_tables_can_be_read_back() {
        let table = Table::new("Congener", vec!["OCDD".to_string(), "OCDF".to_string()])
            .with_column("Gas", array![0.1, 1.0 / 3.0])
            .with_column("Particulate", array![f64::NAN, 2e-9]);
        let writer = CsvWriter::new(vec!["a, b".to_string()]);
        let text = writer.to_csv_string(&table).unwrap();

        let read = CsvReader::new("Congener").parse(&text, "test").unwrap();
        assert_eq!(read.column("Gas").unwrap(), table.column("Gas").unwrap());
        assert!(read.value("OCDD", "Particulate").unwrap().is_nan());
        assert_eq!(read.value("OCDF", "Particulate"), Some(2e-9));
    }
}
