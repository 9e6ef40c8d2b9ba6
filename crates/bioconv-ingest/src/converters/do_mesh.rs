//! Disease Ontology to MeSH cross references
//!
//! Reads OBO `[Term]` stanzas. Each non-obsolete term with at least one MeSH
//! xref becomes a `DOTerm` linked to its `MeshTerm`s and to `DiseaseConcept`s
//! for its UMLS CUI xrefs.

use crate::framework::{Converter, ItemContext, Resolver};
use bioconv_common::{ItemRef, Result};
use std::collections::BTreeSet;
use std::io::BufRead;
use tracing::{debug, info};

const MESH_XREF: &str = "xref: MESH:";
const UMLS_XREF: &str = "xref: UMLS_CUI:";

/// First token of an xref value; OBO allows a quoted description after it
fn xref_value(rest: &str) -> Option<&str> {
    rest.split_whitespace().next()
}

#[derive(Debug, Default)]
struct Stanza {
    is_term: bool,
    identifier: Option<String>,
    obsolete: bool,
    mesh_ids: BTreeSet<String>,
    cuis: BTreeSet<String>,
}

impl Stanza {
    fn term() -> Self {
        Self {
            is_term: true,
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.identifier.is_none() && self.mesh_ids.is_empty()
    }
}

pub struct DoMeshConverter {
    ontologies: Resolver<String>,
    mesh_terms: Resolver<String>,
    concepts: Resolver<String>,
    terms: usize,
    obsolete: usize,
}

impl Default for DoMeshConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DoMeshConverter {
    pub fn new() -> Self {
        Self {
            ontologies: Resolver::keyed("Ontology", "name"),
            mesh_terms: Resolver::keyed("MeshTerm", "identifier"),
            concepts: Resolver::keyed("DiseaseConcept", "identifier"),
            terms: 0,
            obsolete: 0,
        }
    }

    fn mesh_term(&mut self, ctx: &mut ItemContext<'_>, mesh_id: &str) -> Result<ItemRef> {
        if let Some(existing) = self.mesh_terms.get(mesh_id) {
            return Ok(existing.clone());
        }
        let mesh = self.ontologies.resolve(ctx, "MeSH")?;
        self.mesh_terms.resolve_with(ctx, mesh_id, |_, term| {
            term.set_reference("ontology", mesh);
            Ok(())
        })
    }

    fn finish_stanza(&mut self, ctx: &mut ItemContext<'_>, stanza: Stanza) -> Result<()> {
        if !stanza.is_term || stanza.mesh_ids.is_empty() {
            return Ok(());
        }
        let Some(identifier) = stanza.identifier else {
            debug!("Term stanza without id");
            return Ok(());
        };
        if stanza.obsolete {
            self.obsolete += 1;
            return Ok(());
        }

        let ontology = self.ontologies.resolve(ctx, "DO")?;
        let mut cross_references = Vec::new();
        for mesh_id in &stanza.mesh_ids {
            cross_references.push(self.mesh_term(ctx, mesh_id)?);
        }
        let mut concepts = Vec::new();
        for cui in &stanza.cuis {
            concepts.push(self.concepts.resolve(ctx, cui.as_str())?);
        }

        let mut term = ctx.create_item("DOTerm");
        term.set_attribute("identifier", identifier);
        term.set_reference("ontology", ontology);
        for mesh in cross_references {
            term.add_to_collection("crossReferences", mesh);
        }
        for concept in concepts {
            term.add_to_collection("diseaseConcepts", concept);
        }
        self.terms += 1;
        ctx.store(term)
    }
}

impl Converter for DoMeshConverter {
    fn name(&self) -> &'static str {
        "do-mesh"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut stanza = Stanza::default();
        let mut lines = 0usize;

        for line in input.lines() {
            let line = line?;
            lines += 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                let finished = std::mem::take(&mut stanza);
                self.finish_stanza(ctx, finished)?;
            } else if trimmed.starts_with('[') {
                let finished = std::mem::take(&mut stanza);
                self.finish_stanza(ctx, finished)?;
                if trimmed == "[Term]" {
                    stanza = Stanza::term();
                }
            } else if let Some(id) = trimmed.strip_prefix("id:") {
                stanza.identifier = Some(id.trim().to_string());
            } else if let Some(rest) = trimmed.strip_prefix(MESH_XREF) {
                if let Some(mesh_id) = xref_value(rest) {
                    stanza.mesh_ids.insert(mesh_id.to_string());
                }
            } else if let Some(rest) = trimmed.strip_prefix(UMLS_XREF) {
                if let Some(cui) = xref_value(rest) {
                    stanza.cuis.insert(cui.to_string());
                }
            } else if trimmed == "is_obsolete: true" {
                stanza.obsolete = true;
            }
        }

        if !stanza.is_empty() {
            self.finish_stanza(ctx, stanza)?;
        }

        ctx.record_rows(lines, 0);
        info!(
            terms = self.terms,
            obsolete = self.obsolete,
            mesh_terms = self.mesh_terms.created(),
            "Processed Disease Ontology terms"
        );
        Ok(())
    }
}
