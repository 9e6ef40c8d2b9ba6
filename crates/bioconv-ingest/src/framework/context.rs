//! Per-run item context
//!
//! Owns everything a run shares between converters' resolvers: the identifier
//! allocator, per-class counters, the organism cache and data-set items.

use super::sink::ItemSink;
use bioconv_common::{Item, ItemRef, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Default identifier namespace (`"1_<seq>"`)
pub const DEFAULT_NAMESPACE: u32 = 1;

pub struct ItemContext<'a> {
    sink: &'a mut dyn ItemSink,
    namespace: u32,
    next_seq: u64,
    stored: BTreeMap<String, usize>,
    rows_read: usize,
    rows_skipped: usize,
    organisms: HashMap<String, ItemRef>,
    data_sources: HashMap<String, ItemRef>,
    data_sets: HashMap<String, ItemRef>,
}

impl<'a> ItemContext<'a> {
    pub fn new(sink: &'a mut dyn ItemSink) -> Self {
        Self::with_namespace(sink, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(sink: &'a mut dyn ItemSink, namespace: u32) -> Self {
        Self {
            sink,
            namespace,
            next_seq: 1,
            stored: BTreeMap::new(),
            rows_read: 0,
            rows_skipped: 0,
            organisms: HashMap::new(),
            data_sources: HashMap::new(),
            data_sets: HashMap::new(),
        }
    }

    /// Create an empty item with a fresh run-unique identifier
    ///
    /// The item is not stored until passed to [`ItemContext::store`].
    pub fn create_item(&mut self, class: &str) -> Item {
        let identifier = ItemRef::new(format!("{}_{}", self.namespace, self.next_seq));
        self.next_seq += 1;
        Item::new(class, identifier)
    }

    /// Hand a finished item to the sink
    pub fn store(&mut self, item: Item) -> Result<()> {
        *self.stored.entry(item.class.clone()).or_insert(0) += 1;
        self.sink.store(item)
    }

    /// Get or create the `Organism` item for a taxon
    pub fn organism(&mut self, taxon_id: &str) -> Result<ItemRef> {
        if let Some(existing) = self.organisms.get(taxon_id) {
            return Ok(existing.clone());
        }

        let mut organism = self.create_item("Organism");
        organism.set_attribute("taxonId", taxon_id);
        let item_ref = organism.item_ref();
        self.store(organism)?;

        debug!(taxon_id, item = %item_ref, "Created organism");
        self.organisms.insert(taxon_id.to_string(), item_ref.clone());
        Ok(item_ref)
    }

    /// Get or create a `DataSource` item by name
    pub fn data_source(&mut self, name: &str) -> Result<ItemRef> {
        if let Some(existing) = self.data_sources.get(name) {
            return Ok(existing.clone());
        }

        let mut source = self.create_item("DataSource");
        source.set_attribute("name", name);
        let item_ref = source.item_ref();
        self.store(source)?;

        self.data_sources.insert(name.to_string(), item_ref.clone());
        Ok(item_ref)
    }

    /// Get or create a `DataSet` item belonging to a data source
    pub fn data_set(&mut self, name: &str, source: &str) -> Result<ItemRef> {
        if let Some(existing) = self.data_sets.get(name) {
            return Ok(existing.clone());
        }

        let source_ref = self.data_source(source)?;
        let mut data_set = self.create_item("DataSet");
        data_set.set_attribute("name", name);
        data_set.set_reference("dataSource", source_ref);
        let item_ref = data_set.item_ref();
        self.store(data_set)?;

        self.data_sets.insert(name.to_string(), item_ref.clone());
        Ok(item_ref)
    }

    /// Add row counters from a finished pass over an input
    pub fn record_rows(&mut self, read: usize, skipped: usize) {
        self.rows_read += read;
        self.rows_skipped += skipped;
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    /// Number of stored items per class
    pub fn items_by_class(&self) -> &BTreeMap<String, usize> {
        &self.stored
    }

    pub fn stored(&self, class: &str) -> usize {
        self.stored.get(class).copied().unwrap_or(0)
    }

    pub fn total_stored(&self) -> usize {
        self.stored.values().sum()
    }

    pub(crate) fn finish(&mut self) -> Result<()> {
        self.sink.finish()
    }
}
