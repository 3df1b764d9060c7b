use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value for one sample or one feature.
/// Used as a `BTreeSet` element by the filters, so `MetadataValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(#[serde(with = "text_float")] f64),
    Bool(bool),
    /// ISO-8601 date string kept as text.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn rank(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for MetadataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetadataValue::String(s) | MetadataValue::Date(s) => s.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => f.to_bits().hash(state),
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::Null => {}
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Date(d) => write!(f, "{d}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Null)
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl<T: Into<MetadataValue>> From<Option<T>> for MetadataValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(MetadataValue::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Non-finite floats in text formats
// ---------------------------------------------------------------------------

/// serde adapter for `f64`. JSON has no NaN or infinities, so human-readable
/// formats write those as `"NaN"`, `"Infinity"` and `"-Infinity"`; binary
/// formats keep the raw value.
pub(crate) mod text_float {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    const NAN: &str = "NaN";
    const INFINITY: &str = "Infinity";
    const NEG_INFINITY: &str = "-Infinity";

    pub fn serialize<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() || !serializer.is_human_readable() {
            return serializer.serialize_f64(*v);
        }
        let label = if v.is_nan() {
            NAN
        } else if v.is_sign_positive() {
            INFINITY
        } else {
            NEG_INFINITY
        };
        serializer.serialize_str(label)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(NumberOrLabel)
        } else {
            deserializer.deserialize_f64(NumberOrLabel)
        }
    }

    struct NumberOrLabel;

    impl<'de> Visitor<'de> for NumberOrLabel {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, \"NaN\", \"Infinity\" or \"-Infinity\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MetadataMap – per-sample / per-feature metadata columns
// ---------------------------------------------------------------------------

/// Metadata columns keyed by name; every column holds one value per
/// sample (or per feature), in matrix order.
pub type MetadataMap = BTreeMap<String, Vec<MetadataValue>>;

/// For each metadata column the sorted set of distinct values.
pub fn unique_values(map: &MetadataMap) -> BTreeMap<String, BTreeSet<MetadataValue>> {
    map.iter()
        .map(|(key, values)| (key.clone(), values.iter().cloned().collect()))
        .collect()
}

/// Pick `positions` (0-based) out of every column of `map`.
pub(crate) fn select_metadata(map: &MetadataMap, positions: &[usize]) -> MetadataMap {
    map.iter()
        .map(|(key, values)| {
            let picked = positions.iter().map(|&i| values[i].clone()).collect();
            (key.clone(), picked)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Annotation – platform / array design tag
// ---------------------------------------------------------------------------

const NO_ANNOTATION: &str = "none";

/// Symbolic identifier of the measurement platform. Stored on disk as a
/// plain string, with `"none"` standing for [`Annotation::None`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Annotation {
    #[default]
    None,
    Tag(String),
}

impl Annotation {
    pub fn as_str(&self) -> &str {
        match self {
            Annotation::None => NO_ANNOTATION,
            Annotation::Tag(tag) => tag,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Annotation::None)
    }
}

impl From<String> for Annotation {
    fn from(s: String) -> Self {
        if s.is_empty() || s == NO_ANNOTATION {
            Annotation::None
        } else {
            Annotation::Tag(s)
        }
    }
}

impl From<&str> for Annotation {
    fn from(s: &str) -> Self {
        Annotation::from(s.to_string())
    }
}

impl From<Annotation> for String {
    fn from(a: Annotation) -> Self {
        a.as_str().to_string()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
