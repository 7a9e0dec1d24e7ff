//! CSV export
//!
//! Metric series and tables of readings are written as plain CSV for
//! spreadsheet and plotting tools.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Delimiter used by [`write_rows`] by default
pub const ROW_DELIMITER: u8 = b';';

/// Write a single named column of values
pub fn write_series<P: AsRef<Path>>(path: P, header: &str, values: &[f64]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_series_to(file, header, values).with_context(|| format!("Failed to write {:?}", path))?;

    tracing::debug!(path = ?path, rows = values.len(), "wrote series");
    Ok(())
}

/// Write a single named column of values to any writer
pub fn write_series_to<W: Write>(writer: W, header: &str, values: &[f64]) -> Result<()> {
    let mut csv = WriterBuilder::new().from_writer(writer);
    csv.write_record([header])?;
    for value in values {
        csv.write_record([value.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write a list of rows, one record per row, without a header.
///
/// Rows may have different lengths.
pub fn write_rows<P: AsRef<Path>, R: AsRef<[f64]>>(path: P, rows: &[R], delimiter: u8) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;

    let mut csv = WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(false)
        .from_writer(file);
    for row in rows {
        csv.write_record(row.as_ref().iter().map(|v| v.to_string()))
            .with_context(|| format!("Failed to write {:?}", path))?;
    }
    csv.flush().with_context(|| format!("Failed to write {:?}", path))?;

    tracing::debug!(path = ?path, rows = rows.len(), "wrote table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_to_buffer() {
        let mut out = Vec::new();
        write_series_to(&mut out, "fhd", &[0.5, 0.25]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "fhd\n0.5\n0.25\n");
    }

    #[test]
    fn test_rows_with_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        write_rows(&path, &[vec![1.0, 0.5], vec![2.0]], ROW_DELIMITER).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1;0.5\n2\n");
    }

    #[test]
    fn test_missing_directory() {
        let err = write_series("/nonexistent/dir/out.csv", "x", &[1.0]).unwrap_err();
        assert!(err.to_string().contains("Failed to create"));
    }
}
