//! DisGeNET gene-disease associations
//!
//! The main file is tab-separated with a header row: gene id (0), disease id
//! (2), disease name (3) and a comma-separated list of source codes (7).
//! Two auxiliary files complete it:
//!
//! - PubMed evidence: header, then `gene, disease, _, _, pmid`
//! - disease mappings: header, then `disease, _, vocabulary, code`; only DO
//!   and MeSH (`MSH`) vocabularies are kept

use crate::framework::{
    Converter, Delimiter, ItemContext, LookupTable, MalformedRowPolicy, Record, RecordReader, Resolver,
    RowSchema, UnknownLookupPolicy,
};
use bioconv_common::{ItemRef, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{BufRead, Read};
use std::path::PathBuf;
use tracing::{debug, info};

/// Source codes used in the association file and the data sources they name
pub const SOURCE_NAMES: &[(&str, &str)] = &[
    ("CTD_human", "Comparative Toxicogenomics Database"),
    ("GWASCAT", "NHGRI GWAS Catalog"),
    ("UNIPROT", "UniProt"),
    ("ORPHANET", "Orphanet"),
    ("CLINVAR", "ClinVar"),
    ("PSYGENET", "PsyGeNET"),
    ("HPO", "Human Phenotype Ontology"),
];

const DO_PREFIX: &str = "DOID:";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisgenetOptions {
    pub pmid_file: Option<PathBuf>,
    pub disease_map_file: Option<PathBuf>,
}

fn source_name(code: &str) -> Option<&'static str> {
    SOURCE_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
}

/// Gene-disease key used by the PubMed evidence table
fn association_key(gene_id: &str, disease_id: &str) -> String {
    format!("{}-{}", gene_id, disease_id)
}

/// Canonical form of a PubMed id (`"0123"` and `"123"` are the same id)
fn normalize_pmid(pmid: &str) -> Option<String> {
    if !pmid.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    pmid.parse::<u64>().ok().map(|id| id.to_string())
}

/// Load `gene-disease -> pmid` evidence; non-numeric PubMed ids are dropped
pub fn load_pmids<R: Read>(input: R) -> Result<LookupTable> {
    let mut table = LookupTable::new();
    for record in RecordReader::new(input, Delimiter::Tab).skip_header_lines(1) {
        let record = record?;
        let Some(pmid) = normalize_pmid(record.get(4)) else {
            debug!(line = record.line, pmid = record.get(4), "Unable to process PubMed id");
            continue;
        };
        table.insert(association_key(record.get(0), record.get(1)), pmid);
    }
    Ok(table)
}

/// Load `disease -> ontology term` mappings (`DOID:<code>` or a MeSH id)
pub fn load_disease_map<R: Read>(input: R) -> Result<LookupTable> {
    let mut table = LookupTable::new();
    for record in RecordReader::new(input, Delimiter::Tab).skip_header_lines(1) {
        let record = record?;
        let code = record.get(3);
        let term = match record.get(2) {
            "DO" => format!("{}{}", DO_PREFIX, code),
            "MSH" => code.to_string(),
            _ => continue,
        };
        if !code.is_empty() {
            table.insert(record.get(0), term);
        }
    }
    Ok(table)
}

#[derive(Debug)]
struct AssociationRow {
    gene_id: String,
    disease_id: String,
    disease_name: String,
    sources: String,
}

impl RowSchema for AssociationRow {
    const COLUMNS: usize = 8;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            gene_id: record.required(0, "gene_id")?,
            disease_id: record.required(2, "disease_id")?,
            disease_name: record.get(3).to_string(),
            sources: record.get(7).to_string(),
        })
    }
}

pub struct DisgenetConverter {
    pmids: LookupTable,
    disease_terms: LookupTable,
    policy: MalformedRowPolicy,
    unknown: UnknownLookupPolicy,
    unknown_sources: BTreeSet<String>,
    genes: Resolver<String>,
    diseases: Resolver<String>,
    publications: Resolver<String>,
    do_terms: Resolver<String>,
    mesh_terms: Resolver<String>,
}

impl DisgenetConverter {
    pub fn new(pmids: LookupTable, disease_terms: LookupTable) -> Self {
        Self {
            pmids,
            disease_terms,
            policy: MalformedRowPolicy::Fail,
            unknown: UnknownLookupPolicy::Skip,
            unknown_sources: BTreeSet::new(),
            genes: Resolver::keyed("Gene", "primaryIdentifier"),
            diseases: Resolver::keyed("DiseaseTerm", "identifier"),
            publications: Resolver::keyed("Publication", "pubMedId"),
            do_terms: Resolver::keyed("DOTerm", "identifier"),
            mesh_terms: Resolver::keyed("MeshTerm", "identifier"),
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_unknown_lookups(mut self, policy: UnknownLookupPolicy) -> Self {
        self.unknown = policy;
        self
    }

    fn ontology_term(&mut self, ctx: &mut ItemContext<'_>, identifier: &str) -> Result<ItemRef> {
        if identifier.starts_with(DO_PREFIX) {
            self.do_terms.resolve(ctx, identifier)
        } else {
            self.mesh_terms.resolve(ctx, identifier)
        }
    }

    fn disease_term(&mut self, ctx: &mut ItemContext<'_>, disease_id: &str, name: &str) -> Result<ItemRef> {
        if let Some(existing) = self.diseases.get(disease_id) {
            return Ok(existing.clone());
        }

        let mut cross_references = Vec::new();
        for term in self.disease_terms.get_all(disease_id).to_vec() {
            cross_references.push(self.ontology_term(ctx, &term)?);
        }

        self.diseases.resolve_with(ctx, disease_id, |_, disease| {
            disease.set_attribute("name", name);
            for term in cross_references {
                disease.add_to_collection("crossReferences", term);
            }
            Ok(())
        })
    }
}

impl Converter for DisgenetConverter {
    fn name(&self) -> &'static str {
        "disgenet"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Tab)
            .skip_header_lines(1)
            .typed::<AssociationRow>(self.policy);
        let mut associations = 0usize;

        for row in rows.by_ref() {
            let row = row?;
            let disease_term = self.disease_term(ctx, &row.disease_id, &row.disease_name)?;
            let gene = self.genes.resolve(ctx, row.gene_id.as_str())?;

            let mut sources = Vec::new();
            for code in row.sources.split(',').map(str::trim).filter(|code| !code.is_empty()) {
                match source_name(code) {
                    Some(name) => sources.push(ctx.data_source(name)?),
                    // reported once per code
                    None if self.unknown_sources.insert(code.to_string()) => {
                        self.unknown.miss("source code", code)?;
                    },
                    None => {},
                }
            }

            let mut publications = Vec::new();
            let key = association_key(&row.gene_id, &row.disease_id);
            for pmid in self.pmids.get_all(&key).to_vec() {
                publications.push(self.publications.resolve(ctx, pmid.as_str())?);
            }

            let mut association = ctx.create_item("Disease");
            association.set_reference("diseaseTerm", disease_term);
            association.set_reference("gene", gene);
            for source in sources {
                association.add_to_collection("sources", source);
            }
            for publication in publications {
                association.add_to_collection("publications", publication);
            }
            ctx.store(association)?;
            associations += 1;
        }

        ctx.record_rows(rows.read(), rows.skipped());
        info!(
            associations,
            diseases = self.diseases.created(),
            genes = self.genes.created(),
            unknown_sources = self.unknown_sources.len(),
            "Processed DisGeNET associations"
        );
        Ok(())
    }
}
