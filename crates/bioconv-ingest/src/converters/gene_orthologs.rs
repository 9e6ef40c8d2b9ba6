//! NCBI gene orthologs
//!
//! Tab-separated `taxon A, gene A, relationship, taxon B, gene B` rows,
//! restricted to pairs where both taxa are in the configured organism set.
//! Rows are grouped into one `Homology` cluster per `taxon_gene` of the
//! A side; the cluster's `genes` collection holds the key gene and all of
//! its orthologs.

use crate::framework::{
    Converter, Delimiter, ItemContext, MalformedRowPolicy, PendingResolver, Record, RecordReader, Resolver,
    RowSchema,
};
use bioconv_common::{ItemRef, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::BufRead;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneOrthologsOptions {
    /// Taxon ids to keep; must not be empty
    pub organisms: Vec<String>,

    /// Header rows in the input
    pub header_lines: usize,
}

#[derive(Debug)]
struct OrthologRow {
    taxon_a: String,
    gene_a: String,
    taxon_b: String,
    gene_b: String,
}

impl RowSchema for OrthologRow {
    const COLUMNS: usize = 5;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            taxon_a: record.required(0, "taxon_a")?,
            gene_a: record.required(1, "gene_a")?,
            taxon_b: record.required(3, "taxon_b")?,
            gene_b: record.required(4, "gene_b")?,
        })
    }
}

pub struct GeneOrthologsConverter {
    organisms: HashSet<String>,
    header_lines: usize,
    policy: MalformedRowPolicy,
    genes: Resolver<String>,
    clusters: PendingResolver<String>,
    filtered: usize,
}

impl GeneOrthologsConverter {
    pub fn new(options: GeneOrthologsOptions) -> Self {
        Self {
            organisms: options.organisms.into_iter().collect(),
            header_lines: options.header_lines,
            policy: MalformedRowPolicy::Fail,
            genes: Resolver::keyed("Gene", "primaryIdentifier"),
            clusters: PendingResolver::keyed("Homology", "identifier"),
            filtered: 0,
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn gene(&mut self, ctx: &mut ItemContext<'_>, gene_id: &str, taxon_id: &str) -> Result<ItemRef> {
        self.genes.resolve_with(ctx, gene_id, |ctx, gene| {
            gene.set_reference("organism", ctx.organism(taxon_id)?);
            Ok(())
        })
    }
}

impl Converter for GeneOrthologsConverter {
    fn name(&self) -> &'static str {
        "gene-orthologs"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Tab)
            .skip_header_lines(self.header_lines)
            .typed::<OrthologRow>(self.policy);

        for row in rows.by_ref() {
            let row = row?;
            if !self.organisms.contains(&row.taxon_a) || !self.organisms.contains(&row.taxon_b) {
                self.filtered += 1;
                continue;
            }

            let key_gene = self.gene(ctx, &row.gene_a, &row.taxon_a)?;
            let ortholog = self.gene(ctx, &row.gene_b, &row.taxon_b)?;

            let key = format!("{}_{}", row.taxon_a, row.gene_a);
            let cluster = self.clusters.resolve_with(ctx, key.as_str(), |_, cluster| {
                cluster.add_to_collection("genes", key_gene);
                Ok(())
            })?;
            cluster.add_to_collection("genes", ortholog);
        }

        ctx.record_rows(rows.read(), rows.skipped());
        Ok(())
    }

    fn close(&mut self, ctx: &mut ItemContext<'_>) -> Result<()> {
        let clusters = self.clusters.flush(ctx)?;
        info!(
            clusters,
            genes = self.genes.created(),
            filtered = self.filtered,
            "Stored homology clusters"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::framework::{run, MemorySink};
    use std::io::Cursor;

    fn options() -> GeneOrthologsOptions {
        GeneOrthologsOptions {
            organisms: vec!["9606".to_string(), "10090".to_string(), "10116".to_string()],
            header_lines: 1,
        }
    }

    const HEADER: &str = "#tax_id\tGeneID\trelationship\tOther_tax_id\tOther_GeneID\n";

    #[test]
    fn test_cluster_per_key_gene() {
        let data = format!(
            "{}9606\t7157\tOrtholog\t10090\t22059\n9606\t7157\tOrtholog\t10116\t24842\n9606\t7157\tOrtholog\t7955\t30590\n",
            HEADER
        );
        let mut sink = MemorySink::new();
        let report = run(&mut GeneOrthologsConverter::new(options()), &mut Cursor::new(data), &mut sink).unwrap();
        assert_eq!(report.rows_read, 3);

        let clusters: Vec<_> = sink.of_class("Homology").collect();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].attribute("identifier"), Some("9606_7157"));
        assert_eq!(clusters[0].collection("genes").len(), 3);

        assert_eq!(sink.of_class("Gene").count(), 3);
        let mouse = sink.find("Organism", "taxonId", "10090").unwrap();
        let gene = sink.find("Gene", "primaryIdentifier", "22059").unwrap();
        assert_eq!(gene.reference("organism"), Some(&mouse.identifier));
        assert!(sink.find("Gene", "primaryIdentifier", "30590").is_none());
    }

    #[test]
    fn test_each_side_key_makes_its_own_cluster() {
        let data = format!("{}9606\t7157\tOrtholog\t10090\t22059\n10090\t22059\tOrtholog\t9606\t7157\n", HEADER);
        let mut sink = MemorySink::new();
        run(&mut GeneOrthologsConverter::new(options()), &mut Cursor::new(data), &mut sink).unwrap();

        assert_eq!(sink.of_class("Homology").count(), 2);
        assert_eq!(sink.of_class("Gene").count(), 2);
        assert!(sink.of_class("Homology").all(|h| h.collection("genes").len() == 2));
    }
}
