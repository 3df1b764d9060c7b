//! Typed container for gene expression data.
//!
//! An [`ExpressionSet`] pairs a features × samples matrix of nullable
//! values with sample names, feature names, per-sample and per-feature
//! metadata, an optional [`MetadataRecord`] describing the experiment and
//! a platform [`Annotation`]. Sets are validated on construction and never
//! change afterwards; [`ExpressionSet::subset`], the metadata filters and
//! [`combine`] derive new ones. [`io`] reads and writes them as bincode,
//! JSON, Parquet, Arrow IPC, CSV/TSV and (with the `hdf5` feature) HDF5.

pub mod data;
pub mod error;
pub mod io;

pub use data::combine::combine;
pub use data::container::{ExpressionSet, ExpressionSetBuilder};
pub use data::experiment::{ExperimentInfo, MetadataRecord, MetadataRecordBuilder};
pub use data::filter::{matching_positions, MetadataFilter};
pub use data::model::{unique_values, Annotation, MetadataMap, MetadataValue};
pub use data::select::{Key, Selection};
pub use error::{Axis, Error, Result};
pub use io::{load, save, save_with, Compression, Format, WriteOptions};
