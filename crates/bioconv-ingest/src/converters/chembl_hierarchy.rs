//! ChEMBL molecule hierarchy
//!
//! Input is a set of `(chembl_id, parent_chembl_id)` pairs, either from a
//! tab-separated export or from the `molecule_hierarchy` table (feature
//! `database`). Every molecule references its parent unless it is its own
//! parent, and molecules sharing a parent list each other as alternate forms.

use crate::framework::{
    Converter, Delimiter, ItemContext, MalformedRowPolicy, PendingResolver, Record, RecordReader, RowSchema,
};
use bioconv_common::{ItemRef, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::BufRead;
use tracing::info;

/// Where the hierarchy rows come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchySource {
    #[default]
    File,
    Database,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemblHierarchyOptions {
    pub source: HierarchySource,

    /// PostgreSQL URL of a ChEMBL dump; required for the database source
    pub database_url: Option<String>,

    /// Header rows in the file export
    pub header_lines: usize,
}

#[derive(Debug)]
struct HierarchyRow {
    chembl_id: String,
    parent_id: String,
}

impl RowSchema for HierarchyRow {
    const COLUMNS: usize = 2;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            chembl_id: record.required(0, "chembl_id")?,
            parent_id: record.required(1, "parent_chembl_id")?,
        })
    }
}

/// Molecules grouped by parent, in first-seen order
#[derive(Debug, Default)]
struct ParentGroups {
    index: HashMap<String, usize>,
    groups: Vec<(String, Vec<String>)>,
}

impl ParentGroups {
    fn add(&mut self, chembl_id: String, parent_id: String) {
        let position = match self.index.get(&parent_id) {
            Some(&position) => position,
            None => {
                self.index.insert(parent_id.clone(), self.groups.len());
                self.groups.push((parent_id, Vec::new()));
                self.groups.len() - 1
            },
        };

        let members = &mut self.groups[position].1;
        if !members.contains(&chembl_id) {
            members.push(chembl_id);
        }
    }
}

pub struct ChemblHierarchyConverter {
    header_lines: usize,
    policy: MalformedRowPolicy,
    groups: ParentGroups,
    compounds: PendingResolver<String>,
}

impl Default for ChemblHierarchyConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChemblHierarchyConverter {
    pub fn new() -> Self {
        Self {
            header_lines: 0,
            policy: MalformedRowPolicy::Fail,
            groups: ParentGroups::default(),
            compounds: PendingResolver::keyed("ChemblCompound", "originalId"),
        }
    }

    pub fn with_header_lines(mut self, lines: usize) -> Self {
        self.header_lines = lines;
        self
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add pairs fetched elsewhere (e.g. from the database)
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = (String, String)>) -> Self {
        for (chembl_id, parent_id) in rows {
            self.groups.add(chembl_id, parent_id);
        }
        self
    }

    fn compound(&mut self, ctx: &mut ItemContext<'_>, chembl_id: &str) -> Result<ItemRef> {
        Ok(self.compounds.resolve(ctx, chembl_id)?.item_ref())
    }
}

impl Converter for ChemblHierarchyConverter {
    fn name(&self) -> &'static str {
        "chembl-hierarchy"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Tab)
            .skip_header_lines(self.header_lines)
            .typed::<HierarchyRow>(self.policy);

        for row in rows.by_ref() {
            let row = row?;
            self.groups.add(row.chembl_id, row.parent_id);
        }

        ctx.record_rows(rows.read(), rows.skipped());
        Ok(())
    }

    fn close(&mut self, ctx: &mut ItemContext<'_>) -> Result<()> {
        let groups = std::mem::take(&mut self.groups.groups);

        for (parent_id, members) in &groups {
            let parent = if members.iter().any(|member| member != parent_id) {
                Some(self.compound(ctx, parent_id)?)
            } else {
                None
            };

            let mut refs = Vec::with_capacity(members.len());
            for member in members {
                let item_ref = self.compound(ctx, member)?;
                match (&parent, self.compounds.get_mut(member.as_str())) {
                    (Some(parent), Some(compound)) if member != parent_id => {
                        compound.set_reference("parent", parent.clone());
                    },
                    _ => {},
                }
                refs.push((member, item_ref));
            }

            for (member, _) in &refs {
                let Some(compound) = self.compounds.get_mut(member.as_str()) else {
                    continue;
                };
                for (sibling, sibling_ref) in &refs {
                    if sibling != member {
                        compound.add_to_collection("alternateForms", sibling_ref.clone());
                    }
                }
            }
        }

        let compounds = self.compounds.flush(ctx)?;
        info!(compounds, parents = groups.len(), "Stored ChEMBL compounds");
        Ok(())
    }
}
