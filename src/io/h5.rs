use std::path::Path;
use std::str::FromStr;

use hdf5::types::VarLenUnicode;
use hdf5::File;
use log::debug;
use serde::{Deserialize, Serialize};

use super::record::{EncodedMatrix, KeyedRecord, SchemaVersion};
use crate::data::container::ExpressionSet;
use crate::data::experiment::MetadataRecord;
use crate::data::model::{Annotation, MetadataMap};
use crate::error::{Error, Result};

const FORMAT: &str = "HDF5";

// ---------------------------------------------------------------------------
// HDF5 layout
//
//   /values          f64 [features, samples], NaN for missing
//   /sample_names    vlen utf-8 [samples]
//   /feature_names   vlen utf-8 [features]
//   @format_version  u32
//   @has_missing     bool
//   @annotation      vlen utf-8
//   @metadata        vlen utf-8, JSON of the metadata maps and experiment data
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct Metadata {
    #[serde(default)]
    sample_metadata: MetadataMap,
    #[serde(default)]
    feature_metadata: MetadataMap,
    #[serde(default)]
    experiment_data: Option<MetadataRecord>,
}

fn unicode(s: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(s).map_err(|e| Error::malformed(FORMAT, format!("string '{s}': {e}")))
}

fn unicode_vec(names: &[String]) -> Result<Vec<VarLenUnicode>> {
    names.iter().map(|n| unicode(n)).collect()
}

pub fn write(set: &ExpressionSet, path: &Path) -> Result<()> {
    let record = KeyedRecord::from_set(set);
    let file = File::create(path)?;

    let (rows, cols) = (record.values.rows, record.values.cols);
    file.new_dataset::<f64>()
        .shape((rows, cols))
        .create("values")?
        .write_raw(&record.values.data)?;
    file.new_dataset::<VarLenUnicode>()
        .shape(cols)
        .create("sample_names")?
        .write_raw(&unicode_vec(&record.sample_names)?)?;
    file.new_dataset::<VarLenUnicode>()
        .shape(rows)
        .create("feature_names")?
        .write_raw(&unicode_vec(&record.feature_names)?)?;

    file.new_attr::<u32>()
        .create("format_version")?
        .write_scalar(&SchemaVersion::CURRENT.number())?;
    file.new_attr::<bool>()
        .create("has_missing")?
        .write_scalar(&record.values.has_missing)?;
    file.new_attr::<VarLenUnicode>()
        .create("annotation")?
        .write_scalar(&unicode(record.annotation.as_str())?)?;

    let metadata = Metadata {
        sample_metadata: record.sample_metadata,
        feature_metadata: record.feature_metadata,
        experiment_data: record.experiment_data,
    };
    file.new_attr::<VarLenUnicode>()
        .create("metadata")?
        .write_scalar(&unicode(&serde_json::to_string(&metadata)?)?)?;

    file.close()?;
    Ok(())
}

pub fn read(path: &Path) -> Result<ExpressionSet> {
    let file = File::open(path)?;

    let version = SchemaVersion::from_number(file.attr("format_version")?.read_scalar::<u32>()?)?;
    if version != SchemaVersion::Keyed {
        return Err(Error::malformed(
            FORMAT,
            format!("format version {} has no HDF5 layout", version.number()),
        ));
    }

    let values = file.dataset("values")?;
    let shape = values.shape();
    let (rows, cols) = match shape.as_slice() {
        [rows, cols] => (*rows, *cols),
        other => return Err(Error::malformed(FORMAT, format!("'values' has shape {other:?}"))),
    };
    let data = values.read_raw::<f64>()?;

    let names = |name: &str| -> Result<Vec<String>> {
        Ok(file
            .dataset(name)?
            .read_raw::<VarLenUnicode>()?
            .iter()
            .map(|s| s.as_str().to_string())
            .collect())
    };
    let sample_names = names("sample_names")?;
    let feature_names = names("feature_names")?;

    let has_missing = file.attr("has_missing")?.read_scalar::<bool>()?;
    let annotation = file.attr("annotation")?.read_scalar::<VarLenUnicode>()?;
    let metadata_json = file.attr("metadata")?.read_scalar::<VarLenUnicode>()?;
    let metadata: Metadata = serde_json::from_str(metadata_json.as_str())?;
    debug!("HDF5 {}: {rows} features x {cols} samples", path.display());

    KeyedRecord {
        values: EncodedMatrix {
            rows,
            cols,
            has_missing,
            data,
        },
        sample_names,
        feature_names,
        sample_metadata: metadata.sample_metadata,
        feature_metadata: metadata.feature_metadata,
        experiment_data: metadata.experiment_data,
        annotation: Annotation::from(annotation.as_str()),
    }
    .into_set(FORMAT)
}
