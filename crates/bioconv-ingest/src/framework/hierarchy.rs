//! Classification hierarchies with forward references
//!
//! Nodes are collected during the pass over the input and resolved once the
//! whole input is known, so a child may appear before its parent. Parents are
//! created recursively and memoized in the caller's [`Resolver`].

use super::context::ItemContext;
use super::resolver::Resolver;
use bioconv_common::{ConvertError, Item, ItemRef, Result};
use std::collections::{HashMap, HashSet};

/// One collected node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode<T> {
    pub code: String,
    pub parent: Option<String>,
    pub data: T,
}

#[derive(Debug)]
pub struct Hierarchy<T> {
    order: Vec<String>,
    nodes: HashMap<String, HierarchyNode<T>>,
}

impl<T> Default for Hierarchy<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            nodes: HashMap::new(),
        }
    }
}

impl<T> Hierarchy<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; returns `false` and keeps the first node if the code repeats
    pub fn insert(&mut self, code: impl Into<String>, parent: Option<String>, data: T) -> bool {
        let code = code.into();
        if self.nodes.contains_key(&code) {
            return false;
        }
        self.order.push(code.clone());
        self.nodes.insert(code.clone(), HierarchyNode { code, parent, data });
        true
    }

    pub fn get(&self, code: &str) -> Option<&HierarchyNode<T>> {
        self.nodes.get(code)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Create an item for every node, parents before children
    ///
    /// `build` fills in each item; it receives the parent's reference when the
    /// node has one. Fails with [`ConvertError::UnresolvedParent`] if a parent
    /// code was never inserted and [`ConvertError::HierarchyCycle`] on a cycle.
    pub fn resolve<F>(&self, ctx: &mut ItemContext<'_>, resolver: &mut Resolver<String>, mut build: F) -> Result<()>
    where
        F: FnMut(&HierarchyNode<T>, Option<&ItemRef>, &mut Item),
    {
        let mut in_progress = HashSet::new();
        for code in &self.order {
            self.resolve_node(code, None, ctx, resolver, &mut in_progress, &mut build)?;
        }
        Ok(())
    }

    fn resolve_node<F>(
        &self,
        code: &str,
        child: Option<&str>,
        ctx: &mut ItemContext<'_>,
        resolver: &mut Resolver<String>,
        in_progress: &mut HashSet<String>,
        build: &mut F,
    ) -> Result<ItemRef>
    where
        F: FnMut(&HierarchyNode<T>, Option<&ItemRef>, &mut Item),
    {
        if let Some(existing) = resolver.get(code) {
            return Ok(existing.clone());
        }

        let Some(node) = self.nodes.get(code) else {
            return Err(ConvertError::UnresolvedParent {
                code: child.unwrap_or(code).to_string(),
                parent: code.to_string(),
            });
        };

        if !in_progress.insert(code.to_string()) {
            return Err(ConvertError::HierarchyCycle(code.to_string()));
        }

        let parent_ref = match &node.parent {
            Some(parent) => Some(self.resolve_node(parent, Some(code), ctx, resolver, in_progress, build)?),
            None => None,
        };

        let item_ref = resolver.resolve_with(ctx, code, |_, item| {
            build(node, parent_ref.as_ref(), item);
            Ok(())
        })?;

        in_progress.remove(code);
        Ok(item_ref)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::framework::MemorySink;

    fn parent_of(code: &str) -> Option<String> {
        match code.len() {
            1 => None,
            3 => Some(code[..1].to_string()),
            _ => Some(code[..code.len() - 1].to_string()),
        }
    }

    fn chain(codes: &[&str]) -> (MemorySink, usize) {
        let mut hierarchy = Hierarchy::new();
        for code in codes {
            hierarchy.insert(*code, parent_of(code), ());
        }

        let mut sink = MemorySink::new();
        let mut ctx = ItemContext::new(&mut sink);
        let mut resolver = Resolver::keyed("AtcClassification", "atcCode");
        hierarchy
            .resolve(&mut ctx, &mut resolver, |_, parent, item| {
                if let Some(parent) = parent {
                    item.set_reference("parent", parent.clone());
                }
            })
            .unwrap();
        let created = resolver.created();
        drop(ctx);
        (sink, created)
    }

    #[test]
    fn test_resolution_is_order_independent() {
        for order in [["A", "A01", "A01A"], ["A01A", "A01", "A"], ["A01", "A01A", "A"]] {
            let (sink, created) = chain(&order);
            assert_eq!(created, 3);

            let a = sink.find("AtcClassification", "atcCode", "A").unwrap();
            let a01 = sink.find("AtcClassification", "atcCode", "A01").unwrap();
            let a01a = sink.find("AtcClassification", "atcCode", "A01A").unwrap();
            assert!(a.reference("parent").is_none());
            assert_eq!(a01.reference("parent"), Some(&a.identifier));
            assert_eq!(a01a.reference("parent"), Some(&a01.identifier));
        }
    }

    #[test]
    fn test_parents_are_stored_before_children() {
        let (sink, _) = chain(&["A01A", "A01", "A"]);
        let codes: Vec<&str> = sink.items().iter().filter_map(|i| i.attribute("atcCode")).collect();
        assert_eq!(codes, vec!["A", "A01", "A01A"]);
    }

    #[test]
    fn test_missing_parent_is_fatal() {
        let mut hierarchy = Hierarchy::new();
        hierarchy.insert("A", None, ());
        hierarchy.insert("B01", Some("B".to_string()), ());

        let mut sink = MemorySink::new();
        let mut ctx = ItemContext::new(&mut sink);
        let mut resolver = Resolver::new("AtcClassification");
        let err = hierarchy.resolve(&mut ctx, &mut resolver, |_, _, _| {}).unwrap_err();

        match err {
            ConvertError::UnresolvedParent { code, parent } => {
                assert_eq!(code, "B01");
                assert_eq!(parent, "B");
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut hierarchy = Hierarchy::new();
        hierarchy.insert("X", Some("Y".to_string()), ());
        hierarchy.insert("Y", Some("X".to_string()), ());

        let mut sink = MemorySink::new();
        let mut ctx = ItemContext::new(&mut sink);
        let mut resolver = Resolver::new("Node");
        let err = hierarchy.resolve(&mut ctx, &mut resolver, |_, _, _| {}).unwrap_err();
        assert!(matches!(err, ConvertError::HierarchyCycle(_)));
    }

    #[test]
    fn test_duplicate_code_keeps_first() {
        let mut hierarchy = Hierarchy::new();
        assert!(hierarchy.insert("A", None, "first"));
        assert!(!hierarchy.insert("A", None, "second"));
        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy.get("A").unwrap().data, "first");
    }
}
