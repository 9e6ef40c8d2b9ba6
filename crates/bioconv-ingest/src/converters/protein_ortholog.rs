//! Protein orthologs
//!
//! Tab-separated pairs of protein identifiers; each pair links the two
//! proteins through `orthologProteins` in both directions.

use crate::framework::{
    Converter, Delimiter, ItemContext, MalformedRowPolicy, PendingResolver, Record, RecordReader, RowSchema,
};
use bioconv_common::Result;
use std::io::BufRead;
use tracing::info;

#[derive(Debug)]
struct OrthologRow {
    protein_a: String,
    protein_b: String,
}

impl RowSchema for OrthologRow {
    const COLUMNS: usize = 2;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            protein_a: record.required(0, "protein_a")?,
            protein_b: record.required(1, "protein_b")?,
        })
    }
}

pub struct ProteinOrthologConverter {
    policy: MalformedRowPolicy,
    proteins: PendingResolver<String>,
}

impl Default for ProteinOrthologConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProteinOrthologConverter {
    pub fn new() -> Self {
        Self {
            policy: MalformedRowPolicy::Fail,
            proteins: PendingResolver::keyed("Protein", "primaryIdentifier"),
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Converter for ProteinOrthologConverter {
    fn name(&self) -> &'static str {
        "protein-ortholog"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Tab).typed::<OrthologRow>(self.policy);

        for row in rows.by_ref() {
            let row = row?;
            let a = self.proteins.resolve(ctx, row.protein_a.as_str())?.item_ref();
            let b = self.proteins.resolve(ctx, row.protein_b.as_str())?.item_ref();

            if let Some(protein) = self.proteins.get_mut(row.protein_a.as_str()) {
                protein.add_to_collection("orthologProteins", b);
            }
            if let Some(protein) = self.proteins.get_mut(row.protein_b.as_str()) {
                protein.add_to_collection("orthologProteins", a);
            }
        }

        ctx.record_rows(rows.read(), rows.skipped());
        Ok(())
    }

    fn close(&mut self, ctx: &mut ItemContext<'_>) -> Result<()> {
        let proteins = self.proteins.flush(ctx)?;
        info!(proteins, "Stored ortholog proteins");
        Ok(())
    }
}
