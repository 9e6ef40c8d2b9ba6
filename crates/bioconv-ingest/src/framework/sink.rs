//! Item sinks
//!
//! The persistence boundary of a run. Items handed to a sink are final; a
//! converter never gets them back.

use bioconv_common::{Item, Result};
use serde_jsonlines::JsonLinesWriter;
use std::io::Write;

/// Destination for finished items
pub trait ItemSink {
    /// Persist one item
    fn store(&mut self, item: Item) -> Result<()>;

    /// Flush buffered output; called once after the converter's `close`
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every stored item in memory, in storage order
#[derive(Debug, Default)]
pub struct MemorySink {
    items: Vec<Item>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stored items of one class
    pub fn of_class<'a, 'c>(&'a self, class: &'c str) -> impl Iterator<Item = &'a Item> + use<'a, 'c> {
        self.items.iter().filter(move |item| item.is_class(class))
    }

    /// First stored item of `class` whose attribute `name` equals `value`
    pub fn find(&self, class: &str, name: &str, value: &str) -> Option<&Item> {
        self.of_class(class).find(|item| item.attribute(name) == Some(value))
    }

    /// Look up an item by its identifier
    pub fn get(&self, identifier: &bioconv_common::ItemRef) -> Option<&Item> {
        self.items.iter().find(|item| &item.identifier == identifier)
    }
}

impl ItemSink for MemorySink {
    fn store(&mut self, item: Item) -> Result<()> {
        self.items.push(item);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes one JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: JsonLinesWriter<W>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: JsonLinesWriter::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> ItemSink for JsonLinesSink<W> {
    fn store(&mut self, item: Item) -> Result<()> {
        self.writer.write(&item)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bioconv_common::ItemRef;

    #[test]
    fn test_memory_sink_lookup() {
        let mut sink = MemorySink::new();
        let mut gene = Item::new("Gene", ItemRef::new("0_1"));
        gene.set_attribute("primaryIdentifier", "7157");
        sink.store(gene).unwrap();
        sink.store(Item::new("Organism", ItemRef::new("0_2"))).unwrap();

        assert_eq!(sink.of_class("Gene").count(), 1);
        assert!(sink.find("Gene", "primaryIdentifier", "7157").is_some());
        assert!(sink.find("Gene", "primaryIdentifier", "672").is_none());
        assert!(sink.get(&ItemRef::new("0_2")).is_some());
        assert!(!sink.is_finished());
        sink.finish().unwrap();
        assert!(sink.is_finished());
    }

    #[test]
    fn test_json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let mut gene = Item::new("Gene", ItemRef::new("0_1"));
        gene.set_attribute("primaryIdentifier", "7157");
        sink.store(gene).unwrap();
        sink.store(Item::new("Gene", ItemRef::new("0_2"))).unwrap();
        sink.finish().unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Item = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.attribute("primaryIdentifier"), Some("7157"));
    }
}
