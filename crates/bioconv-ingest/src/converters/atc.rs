//! ATC drug classification
//!
//! One `CODE name` pair per line. The parent of a code is implied by its
//! length: level-1 codes (one letter) are roots, level-2 codes (three
//! characters) hang off their first letter, and level 3-4 codes drop their
//! last character. Lines may come in any order.

use crate::framework::{
    Converter, Delimiter, Hierarchy, ItemContext, MalformedRowPolicy, Record, RecordReader, Resolver,
    RowSchema,
};
use bioconv_common::Result;
use std::io::BufRead;
use tracing::{error, info, warn};

#[derive(Debug)]
struct AtcRow {
    code: String,
    name: String,
}

impl RowSchema for AtcRow {
    const COLUMNS: usize = 1;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            code: record.required(0, "atc_code")?,
            name: record.get(1).to_string(),
        })
    }
}

/// Parent code implied by an ATC code, or `Err` for an invalid length
fn parent_code(code: &str) -> std::result::Result<Option<&str>, usize> {
    match code.chars().count() {
        1 => Ok(None),
        3 => Ok(prefix(code, 1)),
        length @ (4 | 5) => Ok(prefix(code, length - 1)),
        other => Err(other),
    }
}

fn prefix(code: &str, chars: usize) -> Option<&str> {
    code.char_indices().nth(chars).map(|(i, _)| &code[..i])
}

pub struct AtcConverter {
    policy: MalformedRowPolicy,
    hierarchy: Hierarchy<String>,
    classifications: Resolver<String>,
    invalid: usize,
}

impl Default for AtcConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl AtcConverter {
    pub fn new() -> Self {
        Self {
            policy: MalformedRowPolicy::Fail,
            hierarchy: Hierarchy::new(),
            classifications: Resolver::keyed("AtcClassification", "atcCode"),
            invalid: 0,
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Converter for AtcConverter {
    fn name(&self) -> &'static str {
        "atc"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Whitespace)
            .max_fields(2)
            .typed::<AtcRow>(self.policy);

        for row in rows.by_ref() {
            let row = row?;
            let parent = match parent_code(&row.code) {
                Ok(parent) => parent.map(str::to_string),
                Err(length) => {
                    error!(code = %row.code, length, "Invalid ATC code");
                    self.invalid += 1;
                    continue;
                },
            };

            let name = if parent.is_none() {
                row.name.to_uppercase()
            } else {
                row.name
            };
            if !self.hierarchy.insert(row.code.as_str(), parent, name) {
                warn!(code = %row.code, "Duplicate ATC code, keeping the first");
            }
        }

        ctx.record_rows(rows.read(), rows.skipped() + self.invalid);
        Ok(())
    }

    fn close(&mut self, ctx: &mut ItemContext<'_>) -> Result<()> {
        self.hierarchy.resolve(ctx, &mut self.classifications, |node, parent, item| {
            item.set_attribute("name", node.data.as_str());
            if let Some(parent) = parent {
                item.set_reference("parent", parent.clone());
            }
        })?;

        info!(
            classifications = self.classifications.created(),
            invalid_codes = self.invalid,
            "Stored ATC classifications"
        );
        Ok(())
    }
}
