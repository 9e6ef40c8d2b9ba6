//! Get-or-create entity caches
//!
//! Every converter deduplicates entities the same way: a natural key (gene
//! id, accession, code, composite relationship key) maps to at most one item
//! per run. The first `resolve` for a key creates the item; every later call
//! returns the cached reference without side effects.
//!
//! [`Resolver`] stores items as soon as they are created. [`PendingResolver`]
//! keeps them in memory so references and collections can still be attached,
//! and hands them to the sink in [`PendingResolver::flush`] at close.

use super::context::ItemContext;
use bioconv_common::{Item, ItemRef, Result};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use tracing::debug;

/// Cache of stored items keyed by natural identifier
#[derive(Debug)]
pub struct Resolver<K> {
    class: &'static str,
    key_attribute: Option<&'static str>,
    cache: HashMap<K, ItemRef>,
    created: usize,
}

impl<K: Eq + Hash> Resolver<K> {
    pub fn new(class: &'static str) -> Self {
        Self {
            class,
            key_attribute: None,
            cache: HashMap::new(),
            created: 0,
        }
    }

    /// Resolver whose items carry their key in `attribute`
    pub fn keyed(class: &'static str, attribute: &'static str) -> Self {
        Self {
            key_attribute: Some(attribute),
            ..Self::new(class)
        }
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    /// Cached reference for a key, if the item was already created
    pub fn get<Q>(&self, key: &Q) -> Option<&ItemRef>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.get(key)
    }

    /// Get or create; `init` populates the item on a cache miss only
    pub fn resolve_with<Q, F>(&mut self, ctx: &mut ItemContext<'_>, key: &Q, init: F) -> Result<ItemRef>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ToOwned<Owned = K> + ?Sized,
        F: FnOnce(&mut ItemContext<'_>, &mut Item) -> Result<()>,
    {
        if let Some(existing) = self.cache.get(key) {
            return Ok(existing.clone());
        }

        let mut item = ctx.create_item(self.class);
        if let Some(attribute) = self.key_attribute {
            item.set_attribute(attribute, key.to_string());
        }
        init(ctx, &mut item)?;

        let item_ref = item.item_ref();
        ctx.store(item)?;
        debug!(class = self.class, %key, item = %item_ref, "Created item");

        self.cache.insert(key.to_owned(), item_ref.clone());
        self.created += 1;
        Ok(item_ref)
    }

    /// Get or create with no extra population
    pub fn resolve<Q>(&mut self, ctx: &mut ItemContext<'_>, key: &Q) -> Result<ItemRef>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ToOwned<Owned = K> + ?Sized,
    {
        self.resolve_with(ctx, key, |_, _| Ok(()))
    }

    /// Number of items this resolver created
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Cache of items held back until close
///
/// Items are flushed in creation order.
#[derive(Debug)]
pub struct PendingResolver<K> {
    class: &'static str,
    key_attribute: Option<&'static str>,
    index: HashMap<K, usize>,
    items: Vec<Item>,
    created: usize,
}

impl<K: Eq + Hash> PendingResolver<K> {
    pub fn new(class: &'static str) -> Self {
        Self {
            class,
            key_attribute: None,
            index: HashMap::new(),
            items: Vec::new(),
            created: 0,
        }
    }

    pub fn keyed(class: &'static str, attribute: &'static str) -> Self {
        Self {
            key_attribute: Some(attribute),
            ..Self::new(class)
        }
    }

    /// Get or create; `init` populates the item on a cache miss only
    pub fn resolve_with<Q, F>(&mut self, ctx: &mut ItemContext<'_>, key: &Q, init: F) -> Result<&mut Item>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ToOwned<Owned = K> + ?Sized,
        F: FnOnce(&mut ItemContext<'_>, &mut Item) -> Result<()>,
    {
        if let Some(&position) = self.index.get(key) {
            return Ok(&mut self.items[position]);
        }

        let mut item = ctx.create_item(self.class);
        if let Some(attribute) = self.key_attribute {
            item.set_attribute(attribute, key.to_string());
        }
        init(ctx, &mut item)?;
        debug!(class = self.class, %key, item = %item.identifier, "Created pending item");

        let position = self.items.len();
        self.items.push(item);
        self.index.insert(key.to_owned(), position);
        self.created += 1;
        Ok(&mut self.items[position])
    }

    pub fn resolve<Q>(&mut self, ctx: &mut ItemContext<'_>, key: &Q) -> Result<&mut Item>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ToOwned<Owned = K> + ?Sized,
    {
        self.resolve_with(ctx, key, |_, _| Ok(()))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&Item>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&position| &self.items[position])
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut Item>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = *self.index.get(key)?;
        self.items.get_mut(position)
    }

    /// Held items in creation order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store every held item; the cache is empty afterwards
    pub fn flush(&mut self, ctx: &mut ItemContext<'_>) -> Result<usize> {
        let count = self.items.len();
        self.index.clear();
        for item in self.items.drain(..) {
            ctx.store(item)?;
        }
        debug!(class = self.class, count, "Flushed pending items");
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::framework::MemorySink;
    use proptest::prelude::*;

    #[test]
    fn test_resolve_is_idempotent() {
        let mut sink = MemorySink::new();
        let mut ctx = ItemContext::new(&mut sink);
        let mut genes: Resolver<String> = Resolver::keyed("Gene", "primaryIdentifier");

        let first = genes.resolve(&mut ctx, "7157").unwrap();
        let second = genes.resolve(&mut ctx, "7157").unwrap();
        assert_eq!(first, second);
        assert_eq!(genes.created(), 1);
        drop(ctx);

        assert_eq!(sink.of_class("Gene").count(), 1);
        let gene = sink.get(&first).unwrap();
        assert_eq!(gene.attribute("primaryIdentifier"), Some("7157"));
    }

    #[test]
    fn test_init_runs_only_on_miss() {
        let mut sink = MemorySink::new();
        let mut ctx = ItemContext::new(&mut sink);
        let mut genes: Resolver<String> = Resolver::new("Gene");
        let mut calls = 0;

        for _ in 0..3 {
            genes
                .resolve_with(&mut ctx, "672", |ctx, item| {
                    calls += 1;
                    item.set_reference("organism", ctx.organism("9606")?);
                    Ok(())
                })
                .unwrap();
        }

        assert_eq!(calls, 1);
        assert_eq!(ctx.stored("Organism"), 1);
        assert_eq!(ctx.stored("Gene"), 1);
    }

    #[test]
    fn test_failed_init_does_not_cache() {
        let mut sink = MemorySink::new();
        let mut ctx = ItemContext::new(&mut sink);
        let mut genes: Resolver<String> = Resolver::new("Gene");

        let result = genes.resolve_with(&mut ctx, "x", |_, _| Err(bioconv_common::ConvertError::parse("bad")));
        assert!(result.is_err());
        assert!(genes.get("x").is_none());
        assert_eq!(genes.created(), 0);
    }

    #[test]
    fn test_pending_items_grow_until_flush() {
        let mut sink = MemorySink::new();
        let mut ctx = ItemContext::new(&mut sink);
        let mut proteins: PendingResolver<String> = PendingResolver::keyed("Protein", "primaryAccession");

        proteins
            .resolve(&mut ctx, "P04637")
            .unwrap()
            .add_to_collection("pathways", ItemRef::new("1_90"));
        proteins
            .resolve(&mut ctx, "P04637")
            .unwrap()
            .add_to_collection("pathways", ItemRef::new("1_91"));
        assert_eq!(ctx.stored("Protein"), 0);

        assert_eq!(proteins.flush(&mut ctx).unwrap(), 1);
        assert!(proteins.is_empty());
        drop(ctx);

        let protein = sink.find("Protein", "primaryAccession", "P04637").unwrap();
        assert_eq!(protein.collection("pathways").len(), 2);
    }

    #[test]
    fn test_pending_flush_keeps_creation_order() {
        let mut sink = MemorySink::new();
        let mut ctx = ItemContext::new(&mut sink);
        let mut compounds: PendingResolver<String> = PendingResolver::keyed("ChemblCompound", "originalId");
        for id in ["CHEMBL3", "CHEMBL1", "CHEMBL2"] {
            compounds.resolve(&mut ctx, id).unwrap();
        }
        compounds.flush(&mut ctx).unwrap();
        drop(ctx);

        let ids: Vec<&str> = sink.items().iter().filter_map(|i| i.attribute("originalId")).collect();
        assert_eq!(ids, vec!["CHEMBL3", "CHEMBL1", "CHEMBL2"]);
    }

    proptest! {
        #[test]
        fn prop_one_item_per_distinct_key(keys in proptest::collection::vec("[A-C][0-9]", 0..40)) {
            let mut sink = MemorySink::new();
            let mut ctx = ItemContext::new(&mut sink);
            let mut resolver: Resolver<String> = Resolver::keyed("Gene", "primaryIdentifier");
            let mut refs = HashMap::new();

            for key in &keys {
                let item_ref = resolver.resolve(&mut ctx, key.as_str()).unwrap();
                let previous = refs.entry(key.clone()).or_insert_with(|| item_ref.clone());
                prop_assert_eq!(&*previous, &item_ref);
            }

            prop_assert_eq!(resolver.created(), refs.len());
            prop_assert_eq!(ctx.stored("Gene"), refs.len());
        }
    }
}
