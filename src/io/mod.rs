//! Persistence: load and save an [`ExpressionSet`] by file extension.
//!
//! Supported formats:
//! * `.bin` / `.exprset`          – bincode record with a versioned header
//! * `.json`                      – serde record with `format_version`
//! * `.parquet` / `.pq`           – expression table, metadata in the schema
//! * `.arrow` / `.ipc` / `.feather` – same layout as Parquet, Arrow IPC file
//! * `.csv` / `.tsv` / `.txt`     – matrix only
//! * `.h5` / `.hdf5`              – HDF5 (needs the `hdf5` feature)

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};

use crate::data::container::ExpressionSet;
use crate::error::{Error, Result};

pub mod binary;
pub mod columnar;
pub mod delimited;
#[cfg(feature = "hdf5")]
pub mod h5;
pub mod json;
pub mod record;

pub use record::SchemaVersion;

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Binary,
    Json,
    Parquet,
    ArrowIpc,
    Csv,
    Tsv,
    Hdf5,
}

impl Format {
    pub fn from_extension(ext: &str) -> Result<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "bin" | "exprset" => Ok(Format::Binary),
            "json" => Ok(Format::Json),
            "parquet" | "pq" => Ok(Format::Parquet),
            "arrow" | "ipc" | "feather" => Ok(Format::ArrowIpc),
            "csv" => Ok(Format::Csv),
            "tsv" | "txt" => Ok(Format::Tsv),
            "h5" | "hdf5" => Ok(Format::Hdf5),
            other => Err(Error::UnsupportedFormat(format!(".{other}"))),
        }
    }

    pub fn from_path(path: &Path) -> Result<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(format!("{} (no extension)", path.display())))?;
        Format::from_extension(ext)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Binary => "binary",
            Format::Json => "JSON",
            Format::Parquet => "Parquet",
            Format::ArrowIpc => "Arrow IPC",
            Format::Csv => "CSV",
            Format::Tsv => "TSV",
            Format::Hdf5 => "HDF5",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Write options
// ---------------------------------------------------------------------------

/// Page compression for Parquet output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    Uncompressed,
    #[default]
    Snappy,
    Zstd,
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Compression::Uncompressed),
            "snappy" => Ok(Compression::Snappy),
            "zstd" => Ok(Compression::Zstd),
            other => Err(format!("unknown compression '{other}' (none, snappy, zstd)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Indent JSON output.
    pub pretty_json: bool,
    pub compression: Compression,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an expression set from a file. Dispatch by extension.
pub fn load(path: impl AsRef<Path>) -> Result<ExpressionSet> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    debug!("loading {} as {format}", path.display());

    match format {
        Format::Binary => binary::read(path),
        Format::Json => json::read(path),
        Format::Parquet => columnar::read_parquet(path),
        Format::ArrowIpc => columnar::read_ipc(path),
        Format::Csv => delimited::read(path, b','),
        Format::Tsv => delimited::read(path, b'\t'),
        Format::Hdf5 => read_hdf5(path),
    }
}

/// Save with default [`WriteOptions`].
pub fn save(set: &ExpressionSet, path: impl AsRef<Path>) -> Result<()> {
    save_with(set, path, &WriteOptions::default())
}

pub fn save_with(
    set: &ExpressionSet,
    path: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    debug!("saving {} as {format}", path.display());

    if matches!(format, Format::Csv | Format::Tsv)
        && (!set.sample_metadata().is_empty()
            || !set.feature_metadata().is_empty()
            || set.has_experiment_data())
    {
        warn!("{format} output keeps only the matrix; metadata is dropped");
    }

    match format {
        Format::Binary => binary::write(set, path),
        Format::Json => json::write(set, path, options.pretty_json),
        Format::Parquet => columnar::write_parquet(set, path, options.compression),
        Format::ArrowIpc => columnar::write_ipc(set, path),
        Format::Csv => delimited::write(set, path, b','),
        Format::Tsv => delimited::write(set, path, b'\t'),
        Format::Hdf5 => write_hdf5(set, path),
    }
}

#[cfg(feature = "hdf5")]
fn read_hdf5(path: &Path) -> Result<ExpressionSet> {
    h5::read(path)
}

#[cfg(feature = "hdf5")]
fn write_hdf5(set: &ExpressionSet, path: &Path) -> Result<()> {
    h5::write(set, path)
}

#[cfg(not(feature = "hdf5"))]
fn read_hdf5(path: &Path) -> Result<ExpressionSet> {
    Err(hdf5_disabled(path))
}

#[cfg(not(feature = "hdf5"))]
fn write_hdf5(_set: &ExpressionSet, path: &Path) -> Result<()> {
    Err(hdf5_disabled(path))
}

#[cfg(not(feature = "hdf5"))]
fn hdf5_disabled(path: &Path) -> Error {
    warn!("{}: HDF5 support is not compiled in", path.display());
    Error::UnsupportedFormat(format!(
        "{} (built without the `hdf5` feature)",
        path.display()
    ))
}
