use std::fmt;

use log::debug;
use ndarray::Array2;

use super::experiment::MetadataRecord;
use super::model::{select_metadata, Annotation, MetadataMap, MetadataValue};
use super::select::{Key, NameIndex, Selection};
use crate::error::{Axis, Error, Result};

// ---------------------------------------------------------------------------
// ExpressionSet – matrix + names + metadata
// ---------------------------------------------------------------------------

/// An expression matrix (features × samples) with its labels and metadata.
///
/// Built through [`ExpressionSet::builder`], which checks that every name
/// list and metadata column matches the matrix shape. The value is
/// immutable afterwards: subsetting, filtering and combining return new
/// sets.
#[derive(Debug, Clone)]
pub struct ExpressionSet {
    values: Array2<Option<f64>>,
    sample_names: Vec<String>,
    feature_names: Vec<String>,
    sample_metadata: MetadataMap,
    feature_metadata: MetadataMap,
    experiment_data: Option<MetadataRecord>,
    annotation: Annotation,
    sample_index: NameIndex,
    feature_index: NameIndex,
}

// The name indices are derived from the names, so they take no part in equality.
impl PartialEq for ExpressionSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
            && self.sample_names == other.sample_names
            && self.feature_names == other.feature_names
            && self.sample_metadata == other.sample_metadata
            && self.feature_metadata == other.feature_metadata
            && self.experiment_data == other.experiment_data
            && self.annotation == other.annotation
    }
}

impl ExpressionSet {
    /// Start building a set from a nullable matrix and its labels.
    pub fn builder<S, F>(
        values: Array2<Option<f64>>,
        sample_names: impl IntoIterator<Item = S>,
        feature_names: impl IntoIterator<Item = F>,
    ) -> ExpressionSetBuilder
    where
        S: Into<String>,
        F: Into<String>,
    {
        ExpressionSetBuilder {
            values,
            sample_names: sample_names.into_iter().map(Into::into).collect(),
            feature_names: feature_names.into_iter().map(Into::into).collect(),
            sample_metadata: MetadataMap::new(),
            feature_metadata: MetadataMap::new(),
            experiment_data: None,
            annotation: Annotation::None,
        }
    }

    /// Like [`builder`](Self::builder) for a plain numeric matrix; every
    /// entry is widened to `Some(f64)`.
    pub fn builder_from_numeric<T, S, F>(
        values: Array2<T>,
        sample_names: impl IntoIterator<Item = S>,
        feature_names: impl IntoIterator<Item = F>,
    ) -> ExpressionSetBuilder
    where
        T: Copy + Into<f64>,
        S: Into<String>,
        F: Into<String>,
    {
        Self::builder(values.mapv(|v| Some(v.into())), sample_names, feature_names)
    }

    /// Shortcut for a set without metadata.
    pub fn new<S, F>(
        values: Array2<Option<f64>>,
        sample_names: impl IntoIterator<Item = S>,
        feature_names: impl IntoIterator<Item = F>,
    ) -> Result<Self>
    where
        S: Into<String>,
        F: Into<String>,
    {
        Self::builder(values, sample_names, feature_names).build()
    }

    // -- Plain accessors --

    /// The matrix itself, without copying. Rows are features, columns samples.
    pub fn values(&self) -> &Array2<Option<f64>> {
        &self.values
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// `(number of features, number of samples)`.
    pub fn size(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn num_features(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_samples(&self) -> usize {
        self.values.ncols()
    }

    pub fn sample_metadata(&self) -> &MetadataMap {
        &self.sample_metadata
    }

    pub fn feature_metadata(&self) -> &MetadataMap {
        &self.feature_metadata
    }

    /// One sample metadata column, without building a table.
    pub fn sample_metadata_column(&self, key: &str) -> Option<&[MetadataValue]> {
        self.sample_metadata.get(key).map(Vec::as_slice)
    }

    /// One feature metadata column, without building a table.
    pub fn feature_metadata_column(&self, key: &str) -> Option<&[MetadataValue]> {
        self.feature_metadata.get(key).map(Vec::as_slice)
    }

    pub fn experiment_data(&self) -> Option<&MetadataRecord> {
        self.experiment_data.as_ref()
    }

    pub fn has_experiment_data(&self) -> bool {
        self.experiment_data.is_some()
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// 1-based position of a sample name.
    pub fn sample_position(&self, name: &str) -> Option<usize> {
        self.sample_index.position(name).map(|i| i + 1)
    }

    /// 1-based position of a feature name.
    pub fn feature_position(&self, name: &str) -> Option<usize> {
        self.feature_index.position(name).map(|i| i + 1)
    }

    /// Single value by feature and sample, each given as a name or a
    /// 1-based position.
    ///
    /// ```
    /// # use exprset::ExpressionSet;
    /// # use ndarray::array;
    /// let set = ExpressionSet::builder_from_numeric(
    ///     array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
    ///     ["S1", "S2"],
    ///     ["A", "B", "C"],
    /// )
    /// .build()?;
    /// assert_eq!(set.get("B", "S2")?, Some(4.0));
    /// assert_eq!(set.get(3usize, 1usize)?, Some(5.0));
    /// # Ok::<(), exprset::Error>(())
    /// ```
    pub fn get<'a, 'b>(
        &self,
        feature: impl Into<Key<'a>>,
        sample: impl Into<Key<'b>>,
    ) -> Result<Option<f64>> {
        let row = self.feature_index.resolve(feature.into())?;
        let col = self.sample_index.resolve(sample.into())?;
        Ok(self.values[[row, col]])
    }

    // -- Derivations --

    /// Select samples and/or features. `None` keeps the whole axis.
    ///
    /// Every name and position is checked before anything is copied; the
    /// first unknown name or out-of-range position is returned as an error.
    pub fn subset(
        &self,
        samples: Option<Selection>,
        features: Option<Selection>,
    ) -> Result<ExpressionSet> {
        let cols = samples
            .map(|sel| self.sample_index.resolve_all(&sel))
            .transpose()?;
        let rows = features
            .map(|sel| self.feature_index.resolve_all(&sel))
            .transpose()?;

        if cols.is_none() && rows.is_none() {
            return Ok(self.clone());
        }

        let mut values = match &rows {
            Some(rows) => self.values.select(ndarray::Axis(0), rows),
            None => self.values.clone(),
        };
        let mut feature_names = self.feature_names.clone();
        let mut feature_metadata = self.feature_metadata.clone();
        if let Some(rows) = &rows {
            feature_names = rows.iter().map(|&i| self.feature_names[i].clone()).collect();
            feature_metadata = select_metadata(&self.feature_metadata, rows);
        }

        let mut sample_names = self.sample_names.clone();
        let mut sample_metadata = self.sample_metadata.clone();
        let mut experiment_data = self.experiment_data.clone();
        if let Some(cols) = &cols {
            values = values.select(ndarray::Axis(1), cols);
            sample_names = cols.iter().map(|&j| self.sample_names[j].clone()).collect();
            sample_metadata = select_metadata(&self.sample_metadata, cols);
            experiment_data = self.experiment_data.as_ref().map(|record| {
                let samples = cols
                    .iter()
                    .filter_map(|&j| record.samples().get(j).cloned())
                    .collect();
                record.with_samples(samples)
            });
        }

        debug!(
            "subset {:?} -> {:?}",
            self.size(),
            (values.nrows(), values.ncols())
        );

        ExpressionSetBuilder {
            values,
            sample_names,
            feature_names,
            sample_metadata,
            feature_metadata,
            experiment_data,
            annotation: self.annotation.clone(),
        }
        .build()
    }

    pub fn subset_samples(&self, samples: impl Into<Selection>) -> Result<ExpressionSet> {
        self.subset(Some(samples.into()), None)
    }

    pub fn subset_features(&self, features: impl Into<Selection>) -> Result<ExpressionSet> {
        self.subset(None, Some(features.into()))
    }

    /// Column-wise concatenation; see [`combine`](super::combine::combine).
    pub fn combine(sets: &[ExpressionSet]) -> Result<ExpressionSet> {
        super::combine::combine(sets)
    }
}

impl fmt::Display for ExpressionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn preview(names: &[String]) -> String {
            const SHOWN: usize = 4;
            let mut out = names
                .iter()
                .take(SHOWN)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if names.len() > SHOWN {
                out.push_str(&format!(", ... ({} total)", names.len()));
            }
            out
        }
        fn keys(map: &MetadataMap) -> String {
            if map.is_empty() {
                "none".to_string()
            } else {
                map.keys().cloned().collect::<Vec<_>>().join(", ")
            }
        }

        writeln!(
            f,
            "ExpressionSet ({} features, {} samples)",
            self.num_features(),
            self.num_samples()
        )?;
        writeln!(f, "  features: {}", preview(&self.feature_names))?;
        writeln!(f, "  samples: {}", preview(&self.sample_names))?;
        writeln!(f, "  feature metadata: {}", keys(&self.feature_metadata))?;
        writeln!(f, "  sample metadata: {}", keys(&self.sample_metadata))?;
        writeln!(
            f,
            "  experiment data: {}",
            if self.has_experiment_data() { "present" } else { "none" }
        )?;
        write!(f, "  annotation: {}", self.annotation)
    }
}

// ---------------------------------------------------------------------------
// Builder – the only way into an ExpressionSet
// ---------------------------------------------------------------------------

/// Collects the optional parts of an [`ExpressionSet`]; [`build`](Self::build)
/// validates the shapes.
#[derive(Debug, Clone)]
pub struct ExpressionSetBuilder {
    values: Array2<Option<f64>>,
    sample_names: Vec<String>,
    feature_names: Vec<String>,
    sample_metadata: MetadataMap,
    feature_metadata: MetadataMap,
    experiment_data: Option<MetadataRecord>,
    annotation: Annotation,
}

impl ExpressionSetBuilder {
    pub fn sample_metadata(mut self, metadata: MetadataMap) -> Self {
        self.sample_metadata = metadata;
        self
    }

    pub fn feature_metadata(mut self, metadata: MetadataMap) -> Self {
        self.feature_metadata = metadata;
        self
    }

    /// Add or replace one sample metadata column.
    pub fn sample_column<V: Into<MetadataValue>>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.sample_metadata
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Add or replace one feature metadata column.
    pub fn feature_column<V: Into<MetadataValue>>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.feature_metadata
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn experiment_data(mut self, record: impl Into<Option<MetadataRecord>>) -> Self {
        self.experiment_data = record.into();
        self
    }

    pub fn annotation(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotation = annotation.into();
        self
    }

    pub fn build(self) -> Result<ExpressionSet> {
        let (num_features, num_samples) = self.values.dim();

        check_len("sample_names", num_samples, self.sample_names.len())?;
        check_len("feature_names", num_features, self.feature_names.len())?;
        for (key, column) in &self.sample_metadata {
            check_len(&format!("sample_metadata[{key}]"), num_samples, column.len())?;
        }
        for (key, column) in &self.feature_metadata {
            check_len(&format!("feature_metadata[{key}]"), num_features, column.len())?;
        }

        debug!("built expression set: {num_features} features x {num_samples} samples");

        Ok(ExpressionSet {
            sample_index: NameIndex::build(Axis::Sample, &self.sample_names),
            feature_index: NameIndex::build(Axis::Feature, &self.feature_names),
            values: self.values,
            sample_names: self.sample_names,
            feature_names: self.feature_names,
            sample_metadata: self.sample_metadata,
            feature_metadata: self.feature_metadata,
            experiment_data: self.experiment_data,
            annotation: self.annotation,
        })
    }
}

/// Give crate-internal code (combine, the loaders) a builder from parts
/// that are already owned.
pub(crate) fn builder_from_parts(
    values: Array2<Option<f64>>,
    sample_names: Vec<String>,
    feature_names: Vec<String>,
) -> ExpressionSetBuilder {
    ExpressionSetBuilder {
        values,
        sample_names,
        feature_names,
        sample_metadata: MetadataMap::new(),
        feature_metadata: MetadataMap::new(),
        experiment_data: None,
        annotation: Annotation::None,
    }
}

fn check_len(field: &str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            field: field.to_string(),
            expected,
            found,
        })
    }
}
