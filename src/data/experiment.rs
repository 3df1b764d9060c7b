use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MetadataRecord – free-text description of an experiment
// ---------------------------------------------------------------------------

/// Experiment-level metadata: who ran it, what it is about and how the
/// samples were processed. Immutable once built; use
/// [`MetadataRecord::builder`] to create one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    lab: String,
    #[serde(default)]
    contact: String,
    #[serde(default)]
    title: String,
    #[serde(default, rename = "abstract")]
    abstract_text: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    pubmed_id: String,
    #[serde(default)]
    samples: Vec<String>,
    #[serde(default)]
    hybridizations: Vec<String>,
    #[serde(default)]
    norm_controls: Vec<String>,
    #[serde(default)]
    preprocessing: Vec<String>,
    #[serde(default)]
    other: BTreeMap<String, String>,
}

/// The identifying subset of a [`MetadataRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentInfo<'a> {
    pub name: &'a str,
    pub lab: &'a str,
    pub contact: &'a str,
    pub title: &'a str,
    pub url: &'a str,
}

impl MetadataRecord {
    pub fn builder() -> MetadataRecordBuilder {
        MetadataRecordBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lab(&self) -> &str {
        &self.lab
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn abstract_text(&self) -> &str {
        &self.abstract_text
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pubmed_id(&self) -> &str {
        &self.pubmed_id
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn hybridizations(&self) -> &[String] {
        &self.hybridizations
    }

    pub fn norm_controls(&self) -> &[String] {
        &self.norm_controls
    }

    pub fn preprocessing(&self) -> &[String] {
        &self.preprocessing
    }

    pub fn other(&self) -> &BTreeMap<String, String> {
        &self.other
    }

    /// Alias of [`other`](Self::other).
    pub fn notes(&self) -> &BTreeMap<String, String> {
        &self.other
    }

    pub fn info(&self) -> ExperimentInfo<'_> {
        ExperimentInfo {
            name: &self.name,
            lab: &self.lab,
            contact: &self.contact,
            title: &self.title,
            url: &self.url,
        }
    }

    /// Merge two records field by field.
    ///
    /// String fields are concatenated as-is (`"X"` + `"Y"` gives `"XY"`),
    /// list fields are appended right after left, and `other` takes the
    /// union with `b` winning on key collisions. See
    /// [`merge_with_separator`](Self::merge_with_separator) for a variant
    /// that keeps the string fields readable.
    pub fn merge(a: &MetadataRecord, b: &MetadataRecord) -> MetadataRecord {
        Self::merge_strings_with(a, b, |x, y| format!("{x}{y}"))
    }

    /// Like [`merge`](Self::merge) but joins non-empty string fields with `sep`.
    pub fn merge_with_separator(
        a: &MetadataRecord,
        b: &MetadataRecord,
        sep: &str,
    ) -> MetadataRecord {
        Self::merge_strings_with(a, b, |x, y| match (x.is_empty(), y.is_empty()) {
            (true, _) => y.to_string(),
            (_, true) => x.to_string(),
            _ => format!("{x}{sep}{y}"),
        })
    }

    fn merge_strings_with(
        a: &MetadataRecord,
        b: &MetadataRecord,
        join: impl Fn(&str, &str) -> String,
    ) -> MetadataRecord {
        let append = |x: &[String], y: &[String]| x.iter().chain(y).cloned().collect::<Vec<_>>();
        let mut other = a.other.clone();
        other.extend(b.other.iter().map(|(k, v)| (k.clone(), v.clone())));

        MetadataRecord {
            name: join(&a.name, &b.name),
            lab: join(&a.lab, &b.lab),
            contact: join(&a.contact, &b.contact),
            title: join(&a.title, &b.title),
            abstract_text: join(&a.abstract_text, &b.abstract_text),
            url: join(&a.url, &b.url),
            pubmed_id: join(&a.pubmed_id, &b.pubmed_id),
            samples: append(&a.samples, &b.samples),
            hybridizations: append(&a.hybridizations, &b.hybridizations),
            norm_controls: append(&a.norm_controls, &b.norm_controls),
            preprocessing: append(&a.preprocessing, &b.preprocessing),
            other,
        }
    }

    /// Copy of this record with its sample list replaced.
    pub(crate) fn with_samples(&self, samples: Vec<String>) -> MetadataRecord {
        MetadataRecord {
            samples,
            ..self.clone()
        }
    }

    pub(crate) fn with_title(&self, title: String) -> MetadataRecord {
        MetadataRecord {
            title,
            ..self.clone()
        }
    }
}

impl fmt::Display for MetadataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Experiment data")?;
        writeln!(f, "  Experimenter name: {}", self.name)?;
        writeln!(f, "  Laboratory: {}", self.lab)?;
        writeln!(f, "  Contact information: {}", self.contact)?;
        writeln!(f, "  Title: {}", self.title)?;
        writeln!(f, "  URL: {}", self.url)?;
        writeln!(f, "  PMIDs: {}", self.pubmed_id)?;
        if !self.abstract_text.is_empty() {
            writeln!(f, "  Abstract: {} words", self.abstract_text.split_whitespace().count())?;
        }
        write!(f, "  Samples: {}", self.samples.len())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Keyword-style construction of a [`MetadataRecord`]; unset fields stay empty.
#[derive(Debug, Clone, Default)]
pub struct MetadataRecordBuilder {
    record: MetadataRecord,
}

macro_rules! string_setter {
    ($($field:ident),*) => {
        $(
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.record.$field = value.into();
                self
            }
        )*
    };
}

macro_rules! list_setter {
    ($($field:ident),*) => {
        $(
            pub fn $field<I, S>(mut self, values: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.record.$field = values.into_iter().map(Into::into).collect();
                self
            }
        )*
    };
}

impl MetadataRecordBuilder {
    string_setter!(name, lab, contact, title, abstract_text, url, pubmed_id);
    list_setter!(samples, hybridizations, norm_controls, preprocessing);

    pub fn other<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.record.other = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn build(self) -> MetadataRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, samples: &[&str]) -> MetadataRecord {
        MetadataRecord::builder()
            .name(name)
            .lab(format!("{name} lab"))
            .title(format!("{name} study"))
            .samples(samples.iter().copied())
            .preprocessing([format!("{name} rma")])
            .other([("platform", name), (name, "yes")])
            .build()
    }

    #[test]
    fn merge_concatenates_strings_without_separator() {
        let merged = MetadataRecord::merge(&record("X", &["s1"]), &record("Y", &["s2", "s3"]));
        assert_eq!(merged.name(), "XY");
        assert_eq!(merged.lab(), "X labY lab");
        assert_eq!(merged.samples(), ["s1", "s2", "s3"]);
        assert_eq!(merged.preprocessing(), ["X rma", "Y rma"]);
    }

    #[test]
    fn merge_lets_right_other_win() {
        let merged = MetadataRecord::merge(&record("X", &[]), &record("Y", &[]));
        assert_eq!(merged.other()["platform"], "Y");
        assert_eq!(merged.other()["X"], "yes");
        assert_eq!(merged.other()["Y"], "yes");
        assert_eq!(merged.notes(), merged.other());
    }

    #[test]
    fn merge_with_separator_skips_empty_sides() {
        let left = MetadataRecord::builder().name("X").build();
        let right = MetadataRecord::builder().name("Y").lab("Lab Y").build();
        let merged = MetadataRecord::merge_with_separator(&left, &right, "; ");
        assert_eq!(merged.name(), "X; Y");
        assert_eq!(merged.lab(), "Lab Y");
        assert_eq!(merged.contact(), "");
    }

    #[test]
    fn info_projects_identifying_fields() {
        let r = MetadataRecord::builder()
            .name("Ann")
            .lab("Genomics")
            .contact("ann@example.org")
            .title("Liver atlas")
            .url("https://example.org")
            .pubmed_id("123")
            .build();
        let info = r.info();
        assert_eq!(info.name, "Ann");
        assert_eq!(info.url, "https://example.org");
        assert_eq!(r.pubmed_id(), "123");
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a = MetadataRecord::builder().samples(["a", "b"]).build();
        let b = MetadataRecord::builder().samples(["b", "a"]).build();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
