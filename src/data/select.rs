use std::collections::HashMap;

use crate::error::{Axis, Error, Result};

// ---------------------------------------------------------------------------
// NameIndex – name → position lookup for one axis
// ---------------------------------------------------------------------------

/// Name → 0-based position. Built once when the container is constructed;
/// with duplicated names the first occurrence wins.
#[derive(Debug, Clone)]
pub(crate) struct NameIndex {
    axis: Axis,
    positions: HashMap<String, usize>,
    len: usize,
}

impl NameIndex {
    pub(crate) fn build(axis: Axis, names: &[String]) -> Self {
        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(i);
        }
        NameIndex {
            axis,
            positions,
            len: names.len(),
        }
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Resolve one key to a 0-based position.
    pub(crate) fn resolve(&self, key: Key<'_>) -> Result<usize> {
        match key {
            Key::Name(name) => self.position(name).ok_or_else(|| Error::NameNotFound {
                axis: self.axis,
                name: name.to_string(),
            }),
            Key::Position(index) => {
                if index == 0 || index > self.len {
                    Err(Error::IndexOutOfBounds {
                        axis: self.axis,
                        index,
                        len: self.len,
                    })
                } else {
                    Ok(index - 1)
                }
            }
        }
    }

    /// Resolve a whole selection to 0-based positions, failing on the first
    /// name or position that does not exist.
    pub(crate) fn resolve_all(&self, selection: &Selection) -> Result<Vec<usize>> {
        match selection {
            Selection::Names(names) => names
                .iter()
                .map(|name| self.resolve(Key::Name(name)))
                .collect(),
            Selection::Positions(indices) => indices
                .iter()
                .map(|&index| self.resolve(Key::Position(index)))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Key – a single feature or sample, by name or by position
// ---------------------------------------------------------------------------

/// Identifies one feature or one sample. Positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Name(&'a str),
    Position(usize),
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(name: &'a str) -> Self {
        Key::Name(name)
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(name: &'a String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key<'_> {
    fn from(index: usize) -> Self {
        Key::Position(index)
    }
}

// ---------------------------------------------------------------------------
// Selection – several features or samples, all by name or all by position
// ---------------------------------------------------------------------------

/// A list of names or a list of 1-based positions along one axis.
/// Order and repetitions are kept in the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Names(Vec<String>),
    Positions(Vec<usize>),
}

impl From<Vec<String>> for Selection {
    fn from(names: Vec<String>) -> Self {
        Selection::Names(names)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(names: Vec<&str>) -> Self {
        Selection::Names(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Selection {
    fn from(names: &[&str]) -> Self {
        Selection::Names(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(names: [&str; N]) -> Self {
        Selection::Names(names.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<usize>> for Selection {
    fn from(indices: Vec<usize>) -> Self {
        Selection::Positions(indices)
    }
}

impl From<&[usize]> for Selection {
    fn from(indices: &[usize]) -> Self {
        Selection::Positions(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Selection {
    fn from(indices: [usize; N]) -> Self {
        Selection::Positions(indices.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> NameIndex {
        let names: Vec<String> = ["S1", "S2", "S1"].iter().map(|s| s.to_string()).collect();
        NameIndex::build(Axis::Sample, &names)
    }

    #[test]
    fn first_duplicate_wins() {
        assert_eq!(index().position("S1"), Some(0));
    }

    #[test]
    fn positions_are_one_based() {
        let idx = index();
        assert_eq!(idx.resolve(Key::Position(1)).unwrap(), 0);
        assert_eq!(idx.resolve(Key::Position(3)).unwrap(), 2);
        assert!(matches!(
            idx.resolve(Key::Position(0)),
            Err(Error::IndexOutOfBounds { index: 0, len: 3, .. })
        ));
        assert!(matches!(
            idx.resolve(Key::Position(4)),
            Err(Error::IndexOutOfBounds { index: 4, .. })
        ));
    }

    #[test]
    fn resolve_all_fails_fast_on_missing_name() {
        let err = index()
            .resolve_all(&Selection::from(vec!["S2", "S9", "S8"]))
            .unwrap_err();
        match err {
            Error::NameNotFound { axis, name } => {
                assert_eq!(axis, Axis::Sample);
                assert_eq!(name, "S9");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
