use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use super::container::ExpressionSet;
use super::model::{MetadataMap, MetadataValue};
use crate::error::Result;

pub const FEATURE_NAMES_COLUMN: &str = "feature_names";
pub const SAMPLE_NAMES_COLUMN: &str = "sample_names";

// ---------------------------------------------------------------------------
// Tabular views of an ExpressionSet
// ---------------------------------------------------------------------------

impl ExpressionSet {
    /// The matrix as a table: a leading `feature_names` column, then one
    /// nullable Float64 column per sample, named after the sample.
    ///
    /// Copies every value; use [`values`](Self::values) when a matrix will do.
    pub fn expression_values_table(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.num_samples() + 1);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.num_samples() + 1);

        fields.push(Field::new(FEATURE_NAMES_COLUMN, DataType::Utf8, false));
        columns.push(string_column(self.feature_names()));

        for (name, column) in self.sample_names().iter().zip(self.values().columns()) {
            fields.push(Field::new(name, DataType::Float64, true));
            columns.push(Arc::new(column.iter().copied().collect::<Float64Array>()));
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    /// Feature metadata as a table: `feature_names` plus one column per key.
    /// Builds every column, so prefer
    /// [`feature_metadata_column`](Self::feature_metadata_column) for a
    /// single lookup on large sets.
    pub fn feature_data(&self) -> Result<RecordBatch> {
        metadata_table(FEATURE_NAMES_COLUMN, self.feature_names(), self.feature_metadata())
    }

    /// Sample metadata as a table: `sample_names` plus one column per key.
    pub fn phenotype_data(&self) -> Result<RecordBatch> {
        metadata_table(SAMPLE_NAMES_COLUMN, self.sample_names(), self.sample_metadata())
    }
}

fn metadata_table(
    id_column: &str,
    names: &[String],
    metadata: &MetadataMap,
) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(id_column, DataType::Utf8, false)];
    let mut columns = vec![string_column(names)];

    for (key, values) in metadata {
        let array = metadata_array(values);
        fields.push(Field::new(key, array.data_type().clone(), true));
        columns.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn string_column(values: &[String]) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

// ---------------------------------------------------------------------------
// MetadataValue column → Arrow array
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

/// Narrowest Arrow type holding every non-null value of the column.
fn column_kind(values: &[MetadataValue]) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for value in values {
        let this = match value {
            MetadataValue::Null => continue,
            MetadataValue::Integer(_) => ColumnKind::Integer,
            MetadataValue::Float(_) => ColumnKind::Float,
            MetadataValue::Bool(_) => ColumnKind::Bool,
            MetadataValue::String(_) | MetadataValue::Date(_) => return ColumnKind::Text,
        };
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Integer), ColumnKind::Float)
            | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
            _ => return ColumnKind::Text,
        });
    }
    // An all-null column has no type of its own; text is the loosest choice.
    kind.unwrap_or(ColumnKind::Text)
}

fn metadata_array(values: &[MetadataValue]) -> ArrayRef {
    match column_kind(values) {
        ColumnKind::Integer => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    MetadataValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        ColumnKind::Float => Arc::new(
            values
                .iter()
                .map(MetadataValue::as_f64)
                .collect::<Float64Array>(),
        ),
        ColumnKind::Bool => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    MetadataValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        ColumnKind::Text => Arc::new(
            values
                .iter()
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<StringArray>(),
        ),
    }
}
