use ndarray::Array2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data::container::{builder_from_parts, ExpressionSet};
use crate::data::experiment::MetadataRecord;
use crate::data::model::{text_float, Annotation, MetadataMap, MetadataValue};
use crate::data::table::{FEATURE_NAMES_COLUMN, SAMPLE_NAMES_COLUMN};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Schema versions
// ---------------------------------------------------------------------------

/// On-disk layouts the loaders understand. Writers always use the newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Sample and feature metadata stored as `phenotype_data` /
    /// `feature_data` tables with their name columns inside.
    Tabular = 1,
    /// Names stored as `sample_names` / `feature_names` next to plain
    /// metadata maps.
    Keyed = 2,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::Keyed;

    pub fn from_number(version: u32) -> Result<Self> {
        match version {
            1 => Ok(SchemaVersion::Tabular),
            2 => Ok(SchemaVersion::Keyed),
            other => Err(Error::malformed(
                "expression set",
                format!("unknown format version {other}"),
            )),
        }
    }

    pub fn number(self) -> u32 {
        self as u32
    }
}

// ---------------------------------------------------------------------------
// EncodedMatrix – nullable matrix for formats without a missing value
// ---------------------------------------------------------------------------

/// Row-major matrix where nulls are written as NaN. `has_missing` tells the
/// reader whether a NaN stands for a null or for an actual NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EncodedMatrix {
    pub rows: usize,
    pub cols: usize,
    pub has_missing: bool,
    #[serde(serialize_with = "nan_as_null", deserialize_with = "null_as_nan")]
    pub data: Vec<f64>,
}

impl EncodedMatrix {
    pub fn encode(values: &Array2<Option<f64>>) -> Self {
        let (rows, cols) = values.dim();
        let has_missing = values.iter().any(Option::is_none);
        EncodedMatrix {
            rows,
            cols,
            has_missing,
            data: values.iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        }
    }

    pub fn decode(self, format: &'static str) -> Result<Array2<Option<f64>>> {
        let has_missing = self.has_missing;
        let data = self
            .data
            .into_iter()
            .map(|v| if has_missing && v.is_nan() { None } else { Some(v) })
            .collect();
        Array2::from_shape_vec((self.rows, self.cols), data)
            .map_err(|e| Error::malformed(format, format!("matrix shape: {e}")))
    }
}

// Both the binary and the text formats write the matrix as `Option<f64>`
// cells, with `None` for NaN. Infinities are kept as values; JSON spells
// them as strings (see `text_float`).
#[derive(Serialize, Deserialize)]
struct Cell(#[serde(with = "text_float")] f64);

fn nan_as_null<S: Serializer>(
    data: &[f64],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(data.iter().map(|&v| (!v.is_nan()).then_some(Cell(v))))
}

fn null_as_nan<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<f64>, D::Error> {
    let raw = Vec::<Option<Cell>>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|cell| cell.map_or(f64::NAN, |Cell(v)| v)).collect())
}

// ---------------------------------------------------------------------------
// Version 2: keyed record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KeyedRecord {
    pub values: EncodedMatrix,
    pub sample_names: Vec<String>,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub sample_metadata: MetadataMap,
    #[serde(default)]
    pub feature_metadata: MetadataMap,
    #[serde(default)]
    pub experiment_data: Option<MetadataRecord>,
    #[serde(default)]
    pub annotation: Annotation,
}

impl KeyedRecord {
    pub fn from_set(set: &ExpressionSet) -> Self {
        KeyedRecord {
            values: EncodedMatrix::encode(set.values()),
            sample_names: set.sample_names().to_vec(),
            feature_names: set.feature_names().to_vec(),
            sample_metadata: set.sample_metadata().clone(),
            feature_metadata: set.feature_metadata().clone(),
            experiment_data: set.experiment_data().cloned(),
            annotation: set.annotation().clone(),
        }
    }

    pub fn into_set(self, format: &'static str) -> Result<ExpressionSet> {
        builder_from_parts(self.values.decode(format)?, self.sample_names, self.feature_names)
            .sample_metadata(self.sample_metadata)
            .feature_metadata(self.feature_metadata)
            .experiment_data(self.experiment_data)
            .annotation(self.annotation)
            .build()
    }
}

// ---------------------------------------------------------------------------
// Version 1: tabular record
// ---------------------------------------------------------------------------

/// Column-major metadata table; one column holds the sample or feature names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct MetadataTable {
    pub columns: Vec<(String, Vec<MetadataValue>)>,
}

impl MetadataTable {
    /// Split the table into its name column and the remaining metadata.
    fn into_names_and_metadata(
        self,
        id_column: &str,
        format: &'static str,
    ) -> Result<(Vec<String>, MetadataMap)> {
        let mut names = None;
        let mut metadata = MetadataMap::new();
        for (key, values) in self.columns {
            if key == id_column && names.is_none() {
                names = Some(values.into_iter().map(|v| v.to_string()).collect());
            } else {
                metadata.insert(key, values);
            }
        }
        let names = names.ok_or_else(|| {
            Error::malformed(format, format!("metadata table has no '{id_column}' column"))
        })?;
        Ok((names, metadata))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TabularRecord {
    pub values: EncodedMatrix,
    pub phenotype_data: MetadataTable,
    pub feature_data: MetadataTable,
    #[serde(default)]
    pub experiment_data: Option<MetadataRecord>,
    #[serde(default)]
    pub annotation: Annotation,
}

impl TabularRecord {
    pub fn into_set(self, format: &'static str) -> Result<ExpressionSet> {
        let (sample_names, sample_metadata) = self
            .phenotype_data
            .into_names_and_metadata(SAMPLE_NAMES_COLUMN, format)?;
        let (feature_names, feature_metadata) = self
            .feature_data
            .into_names_and_metadata(FEATURE_NAMES_COLUMN, format)?;
        KeyedRecord {
            values: self.values,
            sample_names,
            feature_names,
            sample_metadata,
            feature_metadata,
            experiment_data: self.experiment_data,
            annotation: self.annotation,
        }
        .into_set(format)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn nan_is_kept_when_nothing_was_missing() {
        let encoded = EncodedMatrix::encode(&array![[Some(f64::NAN), Some(1.0)]]);
        assert!(!encoded.has_missing);
        let decoded = encoded.decode("test").unwrap();
        assert!(decoded[[0, 0]].unwrap().is_nan());
    }

    #[test]
    fn nan_decodes_to_null_when_flagged() {
        let encoded = EncodedMatrix::encode(&array![[None, Some(1.0)]]);
        assert!(encoded.has_missing);
        assert_eq!(encoded.decode("test").unwrap(), array![[None, Some(1.0)]]);
    }

    #[test]
    fn infinity_next_to_a_null_stays_a_value() {
        let matrix = array![[Some(f64::INFINITY), None, Some(f64::NEG_INFINITY)]];
        let json = serde_json::to_value(EncodedMatrix::encode(&matrix)).unwrap();
        assert_eq!(json["data"], serde_json::json!(["Infinity", null, "-Infinity"]));

        let back: EncodedMatrix = serde_json::from_value(json).unwrap();
        assert_eq!(back.decode("test").unwrap(), matrix);
    }

    #[test]
    fn bad_shape_is_malformed() {
        let encoded = EncodedMatrix {
            rows: 2,
            cols: 2,
            has_missing: false,
            data: vec![1.0],
        };
        assert!(matches!(encoded.decode("test"), Err(Error::Malformed { .. })));
    }

    #[test]
    fn tabular_record_needs_name_column() {
        let record = TabularRecord {
            values: EncodedMatrix::encode(&array![[Some(1.0)]]),
            phenotype_data: MetadataTable::default(),
            feature_data: MetadataTable {
                columns: vec![(FEATURE_NAMES_COLUMN.to_string(), vec!["g".into()])],
            },
            experiment_data: None,
            annotation: Annotation::None,
        };
        assert!(matches!(record.into_set("test"), Err(Error::Malformed { .. })));
    }

    #[test]
    fn schema_versions_round_trip_through_numbers() {
        assert_eq!(SchemaVersion::from_number(1).unwrap(), SchemaVersion::Tabular);
        assert_eq!(SchemaVersion::CURRENT.number(), 2);
        assert!(SchemaVersion::from_number(7).is_err());
    }
}
