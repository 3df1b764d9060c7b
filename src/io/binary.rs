use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;

use super::record::{KeyedRecord, SchemaVersion, TabularRecord};
use crate::data::container::ExpressionSet;
use crate::error::{Error, Result};

const FORMAT: &str = "binary";
const MAGIC: &[u8; 8] = b"EXPRSET\0";

// ---------------------------------------------------------------------------
// Binary container: magic, bincode u32 version, bincode record
// ---------------------------------------------------------------------------

pub fn write(set: &ExpressionSet, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(MAGIC)?;
    bincode::serialize_into(&mut out, &SchemaVersion::CURRENT.number())?;
    bincode::serialize_into(&mut out, &KeyedRecord::from_set(set))?;
    out.flush()?;
    Ok(())
}

pub fn read(path: &Path) -> Result<ExpressionSet> {
    let mut input = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 8];
    input
        .read_exact(&mut magic)
        .map_err(|_| Error::malformed(FORMAT, "file too short for header"))?;
    if &magic != MAGIC {
        return Err(Error::malformed(FORMAT, "not an expression set file (bad magic)"));
    }

    let version: u32 = bincode::deserialize_from(&mut input)?;
    let version = SchemaVersion::from_number(version)?;
    debug!("binary {}: schema {version:?}", path.display());

    match version {
        SchemaVersion::Keyed => {
            let record: KeyedRecord = bincode::deserialize_from(&mut input)?;
            record.into_set(FORMAT)
        }
        SchemaVersion::Tabular => {
            let record: TabularRecord = bincode::deserialize_from(&mut input)?;
            record.into_set(FORMAT)
        }
    }
}

/// Write a version-1 file. Only the tests need to produce old files.
#[cfg(test)]
pub(crate) fn write_tabular(record: &TabularRecord, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(MAGIC)?;
    bincode::serialize_into(&mut out, &SchemaVersion::Tabular.number())?;
    bincode::serialize_into(&mut out, record)?;
    out.flush()?;
    Ok(())
}
