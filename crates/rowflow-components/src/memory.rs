//! Memory Source: a source over rows held in memory

use rowflow_core::{ClassRef, Component, Row, RowStream, Source};
use serde_json::Value;

/// Yields a fixed list of rows.
///
/// Class form: `MemorySource([row, ...])`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<Row>,
}

impl MemorySource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn class() -> ClassRef {
        ClassRef::new("MemorySource", |args: &[Value]| {
            let rows = args[0]
                .as_array()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("rows must be an array"))?;
            Ok(Component::source(MemorySource::new(rows)))
        })
        .with_arity(1)
    }
}

impl Source for MemorySource {
    fn rows(&mut self) -> RowStream<'_> {
        Box::new(self.rows.iter().cloned().map(anyhow::Ok))
    }
}
