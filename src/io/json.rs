use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::record::{KeyedRecord, SchemaVersion, TabularRecord};
use crate::data::container::ExpressionSet;
use crate::error::{Error, Result};

const FORMAT: &str = "JSON";
const VERSION_KEY: &str = "format_version";

#[derive(Serialize)]
struct Versioned<'a> {
    format_version: u32,
    #[serde(flatten)]
    record: &'a KeyedRecord,
}

pub fn write(set: &ExpressionSet, path: &Path, pretty: bool) -> Result<()> {
    let record = KeyedRecord::from_set(set);
    let doc = Versioned {
        format_version: SchemaVersion::CURRENT.number(),
        record: &record,
    };
    let mut out = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut out, &doc)?;
    } else {
        serde_json::to_writer(&mut out, &doc)?;
    }
    out.flush()?;
    Ok(())
}

pub fn read(path: &Path) -> Result<ExpressionSet> {
    let doc: JsonValue = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    from_value(doc)
}

pub(crate) fn from_value(doc: JsonValue) -> Result<ExpressionSet> {
    let version = detect_version(&doc)?;
    debug!("JSON document: schema {version:?}");
    match version {
        SchemaVersion::Keyed => serde_json::from_value::<KeyedRecord>(doc)?.into_set(FORMAT),
        SchemaVersion::Tabular => serde_json::from_value::<TabularRecord>(doc)?.into_set(FORMAT),
    }
}

/// Documents written before `format_version` existed are told apart by
/// the keys holding the sample names.
fn detect_version(doc: &JsonValue) -> Result<SchemaVersion> {
    let obj = doc
        .as_object()
        .ok_or_else(|| Error::malformed(FORMAT, "expected a top-level object"))?;

    if let Some(version) = obj.get(VERSION_KEY) {
        let number = version
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                Error::malformed(FORMAT, format!("'{VERSION_KEY}' is not a version number"))
            })?;
        return SchemaVersion::from_number(number);
    }

    if obj.contains_key("sample_names") {
        Ok(SchemaVersion::Keyed)
    } else if obj.contains_key("phenotype_data") {
        Ok(SchemaVersion::Tabular)
    } else {
        Err(Error::malformed(
            FORMAT,
            "neither 'sample_names' nor 'phenotype_data' present",
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unversioned_keyed_document() {
        let doc = json!({
            "values": {"rows": 1, "cols": 2, "has_missing": true, "data": [1.0, null]},
            "sample_names": ["S1", "S2"],
            "feature_names": ["g"],
        });
        let set = from_value(doc).unwrap();
        assert_eq!(set.get("g", "S1").unwrap(), Some(1.0));
        assert_eq!(set.get("g", "S2").unwrap(), None);
        assert!(set.annotation().is_none());
    }

    #[test]
    fn unversioned_tabular_document() {
        let doc = json!({
            "values": {"rows": 1, "cols": 1, "has_missing": false, "data": [2.0]},
            "phenotype_data": {"columns": [["sample_names", [{"String": "S1"}]]]},
            "feature_data": {"columns": [
                ["feature_names", [{"String": "g"}]],
                ["len", [{"Integer": 9}]]
            ]},
            "annotation": "hgu133a",
        });
        let set = from_value(doc).unwrap();
        assert_eq!(set.sample_names(), ["S1"]);
        assert_eq!(set.feature_metadata_column("len").unwrap().len(), 1);
        assert_eq!(set.annotation().as_str(), "hgu133a");
    }

    #[test]
    fn unknown_shape_is_malformed() {
        assert!(matches!(from_value(json!({"x": 1})), Err(Error::Malformed { .. })));
        assert!(matches!(from_value(json!([1, 2])), Err(Error::Malformed { .. })));
        assert!(matches!(
            from_value(json!({"format_version": 9})),
            Err(Error::Malformed { .. })
        ));
    }
}
