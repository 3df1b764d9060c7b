use std::collections::{BTreeMap, BTreeSet};

use super::container::ExpressionSet;
use super::model::{MetadataMap, MetadataValue};
use super::select::Selection;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per metadata column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column name → set of accepted values.
pub type MetadataFilter = BTreeMap<String, BTreeSet<MetadataValue>>;

/// Return the 1-based positions (out of `len`) that pass all filters.
///
/// A position passes a column filter when:
/// * The filter set for that column is empty → nothing selected → fails
/// * The map has no such column → passes only if `Null` is selected
/// * The position's value for that column is in the selected set → passes
pub fn matching_positions(
    metadata: &MetadataMap,
    len: usize,
    filters: &MetadataFilter,
) -> Vec<usize> {
    (0..len)
        .filter(|&i| {
            filters.iter().all(|(col, selected)| {
                if selected.is_empty() {
                    return false;
                }
                match metadata.get(col).and_then(|values| values.get(i)) {
                    Some(value) => selected.contains(value),
                    None => selected.contains(&MetadataValue::Null),
                }
            })
        })
        .map(|i| i + 1)
        .collect()
}

impl ExpressionSet {
    /// Keep the samples whose metadata passes `filters`.
    pub fn filter_samples(&self, filters: &MetadataFilter) -> Result<ExpressionSet> {
        let positions = matching_positions(self.sample_metadata(), self.num_samples(), filters);
        self.subset(Some(Selection::Positions(positions)), None)
    }

    /// Keep the features whose metadata passes `filters`.
    pub fn filter_features(&self, filters: &MetadataFilter) -> Result<ExpressionSet> {
        let positions = matching_positions(self.feature_metadata(), self.num_features(), filters);
        self.subset(None, Some(Selection::Positions(positions)))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;

    fn set() -> ExpressionSet {
        let values = Array2::from_elem((1, 4), Some(1.0));
        ExpressionSet::builder(values, ["a", "b", "c", "d"], ["g"])
            .sample_column("tissue", ["liver", "brain", "liver", "heart"])
            .sample_column("batch", [Some(1i64), Some(2), None, Some(1)])
            .build()
            .unwrap()
    }

    fn filter(col: &str, values: &[MetadataValue]) -> MetadataFilter {
        let mut f = MetadataFilter::new();
        f.insert(col.to_string(), values.iter().cloned().collect());
        f
    }

    #[test]
    fn single_column_filter() {
        let f = filter("tissue", &["liver".into()]);
        let kept = set().filter_samples(&f).unwrap();
        assert_eq!(kept.sample_names(), ["a", "c"]);
    }

    #[test]
    fn filters_combine_with_and() {
        let mut f = filter("tissue", &["liver".into(), "heart".into()]);
        f.insert("batch".into(), [MetadataValue::Integer(1)].into_iter().collect());
        assert_eq!(matching_positions(set().sample_metadata(), 4, &f), vec![1, 4]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let f = filter("tissue", &[]);
        assert_eq!(set().filter_samples(&f).unwrap().num_samples(), 0);
    }

    #[test]
    fn unknown_column_matches_only_null() {
        let s = set();
        let metadata = s.sample_metadata();
        assert!(matching_positions(metadata, 4, &filter("sex", &["F".into()])).is_empty());
        assert_eq!(
            matching_positions(metadata, 4, &filter("sex", &[MetadataValue::Null])),
            [1, 2, 3, 4]
        );
    }
}
