use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::compute::{cast, cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Float64Type, Schema};
use arrow::error::ArrowError;
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use log::debug;
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression as ParquetCompression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};

use super::record::SchemaVersion;
use super::Compression;
use crate::data::container::{builder_from_parts, ExpressionSet};
use crate::data::experiment::MetadataRecord;
use crate::data::model::{Annotation, MetadataMap};
use crate::data::table::FEATURE_NAMES_COLUMN;
use crate::error::{Error, Result};

/// Schema metadata key holding everything that is not the matrix.
pub const METADATA_KEY: &str = "exprset";

// ---------------------------------------------------------------------------
// Everything besides the matrix, stored as JSON in the schema metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    format_version: u32,
    #[serde(default)]
    sample_metadata: MetadataMap,
    #[serde(default)]
    feature_metadata: MetadataMap,
    #[serde(default)]
    experiment_data: Option<MetadataRecord>,
    #[serde(default)]
    annotation: Annotation,
}

/// The expression table with the sidecar attached to its schema.
fn to_batch(set: &ExpressionSet) -> Result<RecordBatch> {
    let table = set.expression_values_table()?;
    let sidecar = Sidecar {
        format_version: SchemaVersion::CURRENT.number(),
        sample_metadata: set.sample_metadata().clone(),
        feature_metadata: set.feature_metadata().clone(),
        experiment_data: set.experiment_data().cloned(),
        annotation: set.annotation().clone(),
    };
    let metadata = HashMap::from([(METADATA_KEY.to_string(), serde_json::to_string(&sidecar)?)]);
    let schema = Arc::new(table.schema().as_ref().clone().with_metadata(metadata));
    Ok(RecordBatch::try_new(schema, table.columns().to_vec())?)
}

/// Rebuild a set from a schema and its batches. Tables written by other
/// tools (no sidecar) load with empty metadata.
fn from_batches(
    format: &'static str,
    schema: &Schema,
    batches: &[RecordBatch],
) -> Result<ExpressionSet> {
    let sidecar = schema
        .metadata()
        .get(METADATA_KEY)
        .map(|json| serde_json::from_str::<Sidecar>(json))
        .transpose()?;
    if let Some(sidecar) = &sidecar {
        if SchemaVersion::from_number(sidecar.format_version)? != SchemaVersion::Keyed {
            return Err(Error::malformed(
                format,
                format!("format version {} has no columnar layout", sidecar.format_version),
            ));
        }
    }

    let id_idx = schema
        .index_of(FEATURE_NAMES_COLUMN)
        .map_err(|_| Error::malformed(format, format!("missing '{FEATURE_NAMES_COLUMN}' column")))?;
    let sample_cols: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_idx)
        .map(|(i, f)| (i, f.name().clone()))
        .collect();

    // Unparseable cells are an error, not a null.
    let strict = CastOptions {
        safe: false,
        ..Default::default()
    };
    let mut feature_names: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); sample_cols.len()];

    for batch in batches {
        let names = cast(batch.column(id_idx), &DataType::Utf8)?;
        let names = names.as_string::<i32>();
        if names.null_count() > 0 {
            return Err(Error::malformed(format, "null feature name"));
        }
        feature_names.extend(names.iter().flatten().map(str::to_string));

        for ((col_idx, name), out) in sample_cols.iter().zip(columns.iter_mut()) {
            let values = cast_with_options(batch.column(*col_idx), &DataType::Float64, &strict)
                .map_err(|e| Error::malformed(format, format!("column '{name}': {e}")))?;
            out.extend(values.as_primitive::<Float64Type>().iter());
        }
    }

    let (rows, cols) = (feature_names.len(), columns.len());
    let values = Array2::from_shape_fn((rows, cols), |(i, j)| columns[j][i]);
    let sample_names = sample_cols.into_iter().map(|(_, name)| name).collect();
    debug!("{format}: {rows} features x {cols} samples");

    let builder = builder_from_parts(values, sample_names, feature_names);
    match sidecar {
        Some(sidecar) => builder
            .sample_metadata(sidecar.sample_metadata)
            .feature_metadata(sidecar.feature_metadata)
            .experiment_data(sidecar.experiment_data)
            .annotation(sidecar.annotation)
            .build(),
        None => builder.build(),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn parquet_compression(compression: Compression) -> ParquetCompression {
    match compression {
        Compression::Uncompressed => ParquetCompression::UNCOMPRESSED,
        Compression::Snappy => ParquetCompression::SNAPPY,
        Compression::Zstd => ParquetCompression::ZSTD(ZstdLevel::default()),
    }
}

pub fn write_parquet(set: &ExpressionSet, path: &Path, compression: Compression) -> Result<()> {
    let batch = to_batch(set)?;
    let props = WriterProperties::builder()
        .set_compression(parquet_compression(compression))
        .build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<ExpressionSet> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    from_batches("Parquet", &schema, &batches)
}

// ---------------------------------------------------------------------------
// Arrow IPC file
// ---------------------------------------------------------------------------

pub fn write_ipc(set: &ExpressionSet, path: &Path) -> Result<()> {
    let batch = to_batch(set)?;
    let mut writer = FileWriter::try_new(BufWriter::new(File::create(path)?), &batch.schema())?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}

pub fn read_ipc(path: &Path) -> Result<ExpressionSet> {
    let reader = FileReader::try_new(BufReader::new(File::open(path)?), None)?;
    let schema = reader.schema();
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    from_batches("Arrow IPC", &schema, &batches)
}

#[cfg(test)]
mod tests {
    use arrow::array::{Float32Array, StringArray};
    use arrow::datatypes::Field;

    use super::*;

    #[test]
    fn foreign_table_without_sidecar() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(FEATURE_NAMES_COLUMN, DataType::Utf8, false),
            Field::new("S1", DataType::Float32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["g1", "g2"])),
                Arc::new(Float32Array::from(vec![Some(0.5), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foreign.parquet");
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let set = read_parquet(&path).unwrap();
        assert_eq!(set.size(), (2, 1));
        assert_eq!(set.get("g1", "S1").unwrap(), Some(0.5));
        assert_eq!(set.get("g2", "S1").unwrap(), None);
        assert!(set.sample_metadata().is_empty());
    }

    #[test]
    fn text_cells_must_be_numbers() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(FEATURE_NAMES_COLUMN, DataType::Utf8, false),
            Field::new("S1", DataType::Utf8, true),
        ]));
        let batch_with = |cells: Vec<Option<&str>>| {
            RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(StringArray::from(vec!["g1", "g2"])),
                    Arc::new(StringArray::from(cells)),
                ],
            )
            .unwrap()
        };

        let numeric = batch_with(vec![Some("1.5"), None]);
        let set = from_batches("test", &schema, &[numeric]).unwrap();
        assert_eq!(set.get("g1", "S1").unwrap(), Some(1.5));
        assert_eq!(set.get("g2", "S1").unwrap(), None);

        let text = batch_with(vec![Some("1.5"), Some("high")]);
        assert!(matches!(
            from_batches("test", &schema, &[text]),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn missing_feature_column_is_malformed() {
        let schema = Schema::new(vec![Field::new("S1", DataType::Float64, true)]);
        assert!(matches!(
            from_batches("test", &schema, &[]),
            Err(Error::Malformed { .. })
        ));
    }
}
