//! Metric samples and families produced by the generators

use std::fmt;

/// Kind of a metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Gauge => f.write_str("gauge"),
        }
    }
}

/// One labelled observation
///
/// Keys and values are only ever added together, so both lists always have
/// the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    label_keys: Vec<String>,
    label_values: Vec<String>,
    value: f64,
}

impl Sample {
    pub fn new<K, V>(labels: impl IntoIterator<Item = (K, V)>, value: f64) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let (label_keys, label_values) = labels
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            label_keys,
            label_values,
            value,
        }
    }

    /// Sample with a single label
    pub fn with_label(key: impl Into<String>, value: impl Into<String>, sample_value: f64) -> Self {
        let label: (String, String) = (key.into(), value.into());
        Self::new([label], sample_value)
    }

    pub fn label_keys(&self) -> &[String] {
        &self.label_keys
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.label_keys
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Look up a label value by key
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Put `labels` in front of the existing ones
    pub(crate) fn prepend_labels(&mut self, labels: &[(&str, &str)]) {
        self.label_keys
            .splice(0..0, labels.iter().map(|(k, _)| (*k).to_string()));
        self.label_values
            .splice(0..0, labels.iter().map(|(_, v)| (*v).to_string()));
    }
}

/// Samples generated by one family for one object
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyOutput {
    pub name: &'static str,
    pub kind: MetricKind,
    pub help: &'static str,
    pub samples: Vec<Sample>,
}
