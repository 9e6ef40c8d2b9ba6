//! NCI pathway memberships
//!
//! Tab-separated `UniProt accession, pathway name, pathway id` rows. Isoform
//! suffixes (`P12345-2`) are stripped so isoforms collapse onto the canonical
//! protein.

use crate::framework::{
    Converter, Delimiter, ItemContext, MalformedRowPolicy, PendingResolver, Record, RecordReader, Resolver,
    RowSchema,
};
use bioconv_common::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::info;

pub const DEFAULT_TAXON_ID: &str = "9606";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NciPathwayOptions {
    pub taxon_id: String,
}

impl Default for NciPathwayOptions {
    fn default() -> Self {
        Self {
            taxon_id: DEFAULT_TAXON_ID.to_string(),
        }
    }
}

#[derive(Debug)]
struct MembershipRow {
    accession: String,
    pathway_name: String,
    pathway_id: String,
}

impl RowSchema for MembershipRow {
    const COLUMNS: usize = 3;

    fn from_record(record: &Record) -> Result<Self> {
        let raw = record.required(0, "accession")?;
        let accession = strip_isoform(&raw);
        if accession.is_empty() {
            return Err(ConvertError::InvalidField {
                line: record.line,
                field: "accession",
                value: raw,
            });
        }
        Ok(Self {
            accession: accession.to_string(),
            pathway_name: record.get(1).to_string(),
            pathway_id: record.required(2, "pathway_id")?,
        })
    }
}

/// Canonical accession without an isoform suffix
pub fn strip_isoform(accession: &str) -> &str {
    accession.split('-').next().unwrap_or(accession)
}

pub struct NciPathwayConverter {
    options: NciPathwayOptions,
    policy: MalformedRowPolicy,
    proteins: PendingResolver<String>,
    pathways: Resolver<String>,
}

impl NciPathwayConverter {
    pub fn new(options: NciPathwayOptions) -> Self {
        Self {
            options,
            policy: MalformedRowPolicy::Fail,
            proteins: PendingResolver::keyed("Protein", "primaryAccession"),
            pathways: Resolver::keyed("Pathway", "identifier"),
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Converter for NciPathwayConverter {
    fn name(&self) -> &'static str {
        "nci-pathway"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Tab).typed::<MembershipRow>(self.policy);
        let taxon_id = self.options.taxon_id.as_str();

        for row in rows.by_ref() {
            let row = row?;
            let pathway = self.pathways.resolve_with(ctx, row.pathway_id.as_str(), |ctx, pathway| {
                pathway.set_attribute("name", row.pathway_name.as_str());
                pathway.set_reference("organism", ctx.organism(taxon_id)?);
                Ok(())
            })?;

            let protein = self.proteins.resolve_with(ctx, row.accession.as_str(), |ctx, protein| {
                protein.set_reference("organism", ctx.organism(taxon_id)?);
                Ok(())
            })?;
            protein.add_to_collection("pathways", pathway);
        }

        ctx.record_rows(rows.read(), rows.skipped());
        Ok(())
    }

    fn close(&mut self, ctx: &mut ItemContext<'_>) -> Result<()> {
        let proteins = self.proteins.flush(ctx)?;
        info!(proteins, pathways = self.pathways.created(), "Stored pathway memberships");
        Ok(())
    }
}
