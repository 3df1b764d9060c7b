use std::path::Path;

use ndarray::Array2;

use crate::data::container::{builder_from_parts, ExpressionSet};
use crate::data::table::FEATURE_NAMES_COLUMN;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// CSV / TSV: matrix only
// ---------------------------------------------------------------------------

/// Layout: header row `feature_names,<sample>,<sample>…`, then one row per
/// feature. Empty cells and `NA` are missing values. Metadata, experiment
/// data and annotation are not stored.
pub fn read(path: &Path, delimiter: u8) -> Result<ExpressionSet> {
    let format = format_name(delimiter);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(Error::malformed(format, "missing header row"));
    }
    let sample_names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut feature_names = Vec::new();
    let mut data = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        feature_names.push(record.get(0).unwrap_or("").to_string());
        for (col, cell) in record.iter().skip(1).enumerate() {
            data.push(parse_cell(cell).ok_or_else(|| {
                Error::malformed(
                    format,
                    format!(
                        "row {}, column '{}': '{cell}' is not a number",
                        row_no + 1,
                        sample_names[col]
                    ),
                )
            })?);
        }
    }

    let values = Array2::from_shape_vec((feature_names.len(), sample_names.len()), data)
        .map_err(|e| Error::malformed(format, format!("matrix shape: {e}")))?;
    builder_from_parts(values, sample_names, feature_names).build()
}

pub fn write(set: &ExpressionSet, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    let header = set.sample_names().iter().map(String::as_str);
    writer.write_record(std::iter::once(FEATURE_NAMES_COLUMN).chain(header))?;
    for (name, row) in set.feature_names().iter().zip(set.values().rows()) {
        let cells = row.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default());
        writer.write_record(std::iter::once(name.clone()).chain(cells))?;
    }
    writer.flush()?;
    Ok(())
}

fn format_name(delimiter: u8) -> &'static str {
    if delimiter == b'\t' {
        "TSV"
    } else {
        "CSV"
    }
}

/// `Some(None)` for a missing value, `None` for a cell that is not a number.
fn parse_cell(cell: &str) -> Option<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") {
        return Some(None);
    }
    cell.parse::<f64>().ok().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        std::fs::write(&path, "feature_names,S1,S2\nA,1.5,\nB,NA,4\n").unwrap();

        let set = read(&path, b',').unwrap();
        assert_eq!(set.size(), (2, 2));
        assert_eq!(set.get("A", "S1").unwrap(), Some(1.5));
        assert_eq!(set.get("A", "S2").unwrap(), None);
        assert_eq!(set.get("B", "S1").unwrap(), None);
        assert_eq!(set.get("B", "S2").unwrap(), Some(4.0));
    }

    #[test]
    fn rejects_text_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.tsv");
        std::fs::write(&path, "feature_names\tS1\nA\thigh\n").unwrap();
        assert!(matches!(read(&path, b'\t'), Err(Error::Malformed { format: "TSV", .. })));
    }

    #[test]
    fn parse_cell_cases() {
        assert_eq!(parse_cell(" 2.5 "), Some(Some(2.5)));
        assert_eq!(parse_cell("NA"), Some(None));
        assert_eq!(parse_cell(""), Some(None));
        assert_eq!(parse_cell("x"), None);
    }
}
