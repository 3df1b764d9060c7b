use std::collections::{BTreeSet, HashSet};

use log::{debug, warn};
use ndarray::{concatenate, ArrayView2};

use super::container::{builder_from_parts, ExpressionSet};
use super::experiment::MetadataRecord;
use super::model::{MetadataMap, MetadataValue};
use crate::error::{Error, Result};

const COMBINED_TITLE_PREFIX: &str = "Combined: ";

/// Concatenate expression sets sample-wise (column-wise).
///
/// * All inputs must carry the same feature names in the same order; rows
///   are never realigned.
/// * Sample names are appended in input order. Duplicates are kept.
/// * Sample metadata is the union of all keys; an input without a key
///   contributes [`MetadataValue::Null`] for each of its samples.
/// * Feature metadata and the annotation come from the first input.
/// * Experiment data survives only when every input has some: the first
///   record is kept, its title prefixed with `"Combined: "` and its sample
///   list replaced by all inputs' sample lists. This is intentionally
///   narrower than [`MetadataRecord::merge`].
///
/// A single input is returned unchanged.
pub fn combine(sets: &[ExpressionSet]) -> Result<ExpressionSet> {
    let (first, rest) = sets.split_first().ok_or(Error::EmptyInput)?;
    if rest.is_empty() {
        return Ok(first.clone());
    }

    if let Some(offender) = sets
        .iter()
        .position(|set| set.feature_names() != first.feature_names())
    {
        return Err(Error::IncompatibleFeatures { index: offender });
    }

    let views: Vec<ArrayView2<'_, Option<f64>>> = sets.iter().map(|s| s.values().view()).collect();
    let values = concatenate(ndarray::Axis(1), &views).map_err(|e| Error::DimensionMismatch {
        field: format!("values ({e})"),
        expected: first.num_features(),
        found: views.iter().map(|v| v.nrows()).max().unwrap_or(0),
    })?;

    let sample_names: Vec<String> = sets
        .iter()
        .flat_map(|s| s.sample_names().iter().cloned())
        .collect();
    let mut seen = HashSet::with_capacity(sample_names.len());
    let duplicates = sample_names.iter().filter(|n| !seen.insert(n.as_str())).count();
    if duplicates > 0 {
        warn!("combined expression set has {duplicates} duplicated sample name(s)");
    }

    debug!(
        "combined {} sets into {} features x {} samples",
        sets.len(),
        values.nrows(),
        values.ncols()
    );

    builder_from_parts(values, sample_names, first.feature_names().to_vec())
        .sample_metadata(union_sample_metadata(sets))
        .feature_metadata(first.feature_metadata().clone())
        .experiment_data(combine_experiment_data(sets))
        .annotation(first.annotation().clone())
        .build()
}

fn union_sample_metadata(sets: &[ExpressionSet]) -> MetadataMap {
    let keys: BTreeSet<&String> = sets.iter().flat_map(|s| s.sample_metadata().keys()).collect();
    keys.into_iter()
        .map(|key| {
            let column = sets
                .iter()
                .flat_map(|s| match s.sample_metadata_column(key) {
                    Some(values) => values.to_vec(),
                    None => vec![MetadataValue::Null; s.num_samples()],
                })
                .collect();
            (key.clone(), column)
        })
        .collect()
}

fn combine_experiment_data(sets: &[ExpressionSet]) -> Option<MetadataRecord> {
    let records: Vec<&MetadataRecord> = sets
        .iter()
        .map(ExpressionSet::experiment_data)
        .collect::<Option<_>>()?;
    let first = records.first()?;
    let samples = records
        .iter()
        .flat_map(|r| r.samples().iter().cloned())
        .collect();
    Some(
        first
            .with_title(format!("{COMBINED_TITLE_PREFIX}{}", first.title()))
            .with_samples(samples),
    )
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2};

    use super::*;

    fn set(samples: &[&str], offset: f64) -> ExpressionSet {
        let values = Array2::from_shape_fn((2, samples.len()), |(i, j)| {
            Some(offset + (i * 10 + j) as f64)
        });
        ExpressionSet::builder(values, samples.iter().copied(), ["g1", "g2"])
            .feature_column("symbol", ["TP53", "BRCA1"])
            .annotation("platform")
            .build()
            .unwrap()
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(combine(&[]), Err(Error::EmptyInput)));
    }

    #[test]
    fn single_input_is_returned_unchanged() {
        let a = set(&["a1", "a2"], 0.0);
        assert_eq!(combine(std::slice::from_ref(&a)).unwrap(), a);
    }

    #[test]
    fn samples_are_stacked_in_order() {
        let a = set(&["a1"], 0.0);
        let b = set(&["b1", "b2"], 100.0);
        let c = set(&["c1"], 200.0);
        let combined = combine(&[a.clone(), b, c]).unwrap();
        assert_eq!(combined.num_samples(), 4);
        assert_eq!(combined.feature_names(), a.feature_names());
        assert_eq!(combined.sample_names(), ["a1", "b1", "b2", "c1"]);
        assert_eq!(combined.get("g2", "b2").unwrap(), Some(111.0));
        assert_eq!(combined.feature_metadata(), a.feature_metadata());
        assert_eq!(combined.annotation().as_str(), "platform");
    }

    #[test]
    fn differing_features_are_rejected() {
        let a = set(&["a1"], 0.0);
        let b = ExpressionSet::new(array![[Some(1.0)], [Some(2.0)]], ["b1"], ["g2", "g1"]).unwrap();
        assert!(matches!(
            combine(&[a, b]),
            Err(Error::IncompatibleFeatures { index: 1 })
        ));
    }

    #[test]
    fn missing_sample_metadata_is_filled_with_null() {
        let a = ExpressionSet::builder(array![[Some(1.0), None]], ["a1", "a2"], ["g"])
            .sample_column("batch", [1i64, 1])
            .build()
            .unwrap();
        let b = ExpressionSet::builder(array![[Some(3.0)]], ["b1"], ["g"])
            .sample_column("sex", ["F"])
            .build()
            .unwrap();
        let combined = combine(&[a, b]).unwrap();
        assert_eq!(
            combined.sample_metadata_column("batch").unwrap(),
            [MetadataValue::Integer(1), MetadataValue::Integer(1), MetadataValue::Null]
        );
        assert_eq!(
            combined.sample_metadata_column("sex").unwrap(),
            [MetadataValue::Null, MetadataValue::Null, MetadataValue::from("F")]
        );
    }

    #[test]
    fn experiment_data_is_kept_only_when_all_inputs_have_it() {
        let record = |title: &str, samples: &[&str]| {
            MetadataRecord::builder()
                .title(title)
                .lab(title)
                .samples(samples.iter().copied())
                .build()
        };
        let a = ExpressionSet::builder(array![[Some(1.0)]], ["a"], ["g"])
            .experiment_data(record("first", &["a desc"]))
            .build()
            .unwrap();
        let b = ExpressionSet::builder(array![[Some(2.0)]], ["b"], ["g"])
            .experiment_data(record("second", &["b desc"]))
            .build()
            .unwrap();
        let bare = ExpressionSet::new(array![[Some(3.0)]], ["c"], ["g"]).unwrap();

        let combined = combine(&[a.clone(), b.clone()]).unwrap();
        let exp = combined.experiment_data().unwrap();
        assert_eq!(exp.title(), "Combined: first");
        assert_eq!(exp.lab(), "first");
        assert_eq!(exp.samples(), ["a desc", "b desc"]);

        assert!(!combine(&[a, b, bare]).unwrap().has_experiment_data());
    }
}
