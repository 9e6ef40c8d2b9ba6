//! Auxiliary lookup tables and the unknown-lookup policy
//!
//! Several converters translate identifiers through a side file loaded in
//! full before the main pass (miRNA symbol to accession, protein to gene,
//! gene-disease pair to PubMed ids).

use super::reader::{Delimiter, RecordReader};
use bioconv_common::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

/// What to do when an auxiliary lookup has no answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownLookupPolicy {
    /// Log a warning and omit the dependent item
    #[default]
    Skip,
    /// Abort the run
    Fail,
}

impl UnknownLookupPolicy {
    /// Apply the policy to a missed lookup
    pub fn miss(self, kind: &'static str, key: &str) -> Result<()> {
        match self {
            UnknownLookupPolicy::Skip => {
                warn!(kind, key, "Unknown lookup key, skipping");
                Ok(())
            },
            UnknownLookupPolicy::Fail => Err(ConvertError::UnknownLookup {
                kind,
                key: key.to_string(),
            }),
        }
    }
}

impl std::str::FromStr for UnknownLookupPolicy {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "skip" | "ignore" => Ok(Self::Skip),
            "fail" | "abort" => Ok(Self::Fail),
            _ => Err(ConvertError::parse(format!("Invalid unknown-lookup policy: {}", s))),
        }
    }
}

/// Multi-valued key to value mapping read from a delimited file
///
/// Values keep file order; a repeated (key, value) pair is stored once.
#[derive(Debug, Default, Clone)]
pub struct LookupTable {
    entries: HashMap<String, Vec<String>>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `key_column -> value_column` pairs
    ///
    /// Rows too short for either column, or with an empty key or value, are
    /// ignored.
    pub fn load<R: Read>(
        input: R,
        delimiter: Delimiter,
        header_lines: usize,
        key_column: usize,
        value_column: usize,
    ) -> Result<Self> {
        let mut table = Self::new();
        let mut ignored = 0usize;

        for record in RecordReader::new(input, delimiter).skip_header_lines(header_lines) {
            let record = record?;
            let key = record.get(key_column);
            let value = record.get(value_column);
            if key.is_empty() || value.is_empty() {
                ignored += 1;
                continue;
            }
            table.insert(key, value);
        }

        debug!(keys = table.len(), ignored, "Loaded lookup table");
        Ok(table)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let values = self.entries.entry(key.into()).or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// All values for a key
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
