//! Ordered sequence of blocks making up a project page.

use serde_json::{Map, Value};

use crate::block::{list, Block, BlockId, BlockKind};
use crate::editor::{self, EditorEvent};
use crate::Result;

/// Content document of a project.
///
/// Order of blocks is significant and controlled by the operator. Block ids
/// are unique within the document, they are the key for every edit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Block>", into = "Vec<Block>")]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.position(id).is_some()
    }

    /// Appends a block of the given kind with its default content. Returns
    /// the id of the new block.
    pub fn insert_block(&mut self, kind: BlockKind) -> BlockId {
        let id = self.fresh_id();
        self.blocks.push(Block::new(id.clone(), kind.default_payload()));
        id
    }

    /// Appends an already built block, replacing its id if it collides with
    /// an existing one.
    pub fn push(&mut self, mut block: Block) -> BlockId {
        if self.contains(&block.id) {
            block.id = self.fresh_id();
        }
        let id = block.id.clone();
        self.blocks.push(block);
        id
    }

    /// Shallow-merges `patch` into the payload of the block with given id.
    ///
    /// Returns `false` if no such block exists. The kind of the block is
    /// never changed.
    pub fn update_block_payload(&mut self, id: &BlockId, patch: Map<String, Value>) -> Result<bool> {
        match self.blocks.iter_mut().find(|b| &b.id == id) {
            Some(block) => {
                block.merge(patch)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the block with given id. Returns `false` if it wasn't there.
    pub fn remove_block(&mut self, id: &BlockId) -> bool {
        let len = self.blocks.len();
        self.blocks.retain(|b| &b.id != id);
        self.blocks.len() != len
    }

    /// Moves the block at `from` to `to`. Out-of-range indices are rejected
    /// and leave the document untouched.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        list::reorder_in_place(&mut self.blocks, from, to)
    }

    /// Applies an editor event to the block with given id. Returns `false` if
    /// no such block exists.
    pub fn apply(&mut self, id: &BlockId, event: EditorEvent) -> Result<bool> {
        match self.blocks.iter_mut().find(|b| &b.id == id) {
            Some(block) => {
                editor::apply(block, event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Serializes into the `[{ id, type, content }]` json array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn fresh_id(&self) -> BlockId {
        loop {
            let id = BlockId::generate();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Reassigns ids repeated within the document so that every block stays
    /// addressable.
    pub fn dedup_ids(&mut self) {
        let mut seen = std::collections::HashSet::new();
        for i in 0..self.blocks.len() {
            if !seen.insert(self.blocks[i].id.clone()) {
                let id = self.fresh_id();
                tracing::warn!(old = %self.blocks[i].id, new = %id, "duplicate block id reassigned");
                seen.insert(id.clone());
                self.blocks[i].id = id;
            }
        }
    }
}

impl From<Vec<Block>> for Document {
    fn from(blocks: Vec<Block>) -> Self {
        let mut document = Self { blocks };
        document.dedup_ids();
        document
    }
}

impl From<Document> for Vec<Block> {
    fn from(document: Document) -> Self {
        document.blocks
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::block::{Payload, Stat, StatsBlock, TextBlock};

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.insert_block(BlockKind::Text);
        doc.insert_block(BlockKind::Stats);
        doc.insert_block(BlockKind::Faq);
        doc
    }

    #[test]
    fn insert_uses_registry_default_and_fresh_id() {
        let mut doc = Document::new();
        for kind in BlockKind::iter() {
            let existing: Vec<BlockId> = doc.iter().map(|b| b.id.clone()).collect();
            let id = doc.insert_block(kind);
            assert!(!existing.contains(&id));
            let block = doc.blocks().last().unwrap();
            assert_eq!(block.id, id);
            assert_eq!(block.payload, kind.default_payload());
        }
        assert_eq!(doc.len(), 19);
    }

    #[test]
    fn update_merges_fields() {
        let mut doc = sample();
        let id = doc.blocks()[0].id.clone();
        assert!(doc
            .update_block_payload(&id, patch(json!({ "heading": "Bienvenue" })))
            .unwrap());
        assert!(doc
            .update_block_payload(&id, patch(json!({ "text": "Bonjour" })))
            .unwrap());
        assert_eq!(
            doc.get(&id).unwrap().payload,
            Payload::Text(TextBlock {
                heading: "Bienvenue".to_string(),
                text: "Bonjour".to_string(),
            })
        );
    }

    #[test]
    fn update_of_missing_block_is_noop() {
        let mut doc = sample();
        let before = doc.clone();
        let updated = doc
            .update_block_payload(&BlockId::from("missing"), patch(json!({ "heading": "x" })))
            .unwrap();
        assert!(!updated);
        assert_eq!(doc, before);
    }

    #[test]
    fn remove_present_and_absent() {
        let mut doc = sample();
        let id = doc.blocks()[1].id.clone();
        assert!(doc.remove_block(&id));
        assert_eq!(doc.len(), 2);
        assert!(!doc.contains(&id));

        let before = doc.clone();
        assert!(!doc.remove_block(&BlockId::from("missing")));
        assert_eq!(doc, before);
    }

    #[test]
    fn reorder_there_and_back() {
        let mut doc = sample();
        let original = doc.clone();
        doc.reorder(0, 2).unwrap();
        assert_eq!(doc.blocks()[2].id, original.blocks()[0].id);
        doc.reorder(2, 0).unwrap();
        assert_eq!(doc, original);
    }

    #[test]
    fn reorder_out_of_range_is_rejected() {
        let mut doc = sample();
        let original = doc.clone();
        assert!(doc.reorder(0, 3).is_err());
        assert!(doc.reorder(5, 0).is_err());
        assert_eq!(doc, original);
    }

    #[test]
    fn json_round_trip_keeps_nested_lists() {
        let mut doc = Document::new();
        doc.push(Block::new(
            BlockId::from("s"),
            StatsBlock {
                title: "Impact".to_string(),
                stats: vec![
                    Stat {
                        label: "Schools".to_string(),
                        value: "12".to_string(),
                    },
                    Stat {
                        label: "Pupils".to_string(),
                        value: "1 400".to_string(),
                    },
                ]
                .into(),
            },
        ));
        doc.insert_block(BlockKind::Timeline);
        doc.insert_block(BlockKind::Team);

        let json = doc.to_json().unwrap();
        assert!(json.starts_with('['));
        assert_eq!(Document::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn duplicate_ids_are_reassigned_on_load() {
        let json = r#"[
            { "id": "a", "type": "text", "content": { "heading": "one" } },
            { "id": "a", "type": "text", "content": { "heading": "two" } }
        ]"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.blocks()[0].id.as_str(), "a");
        assert_ne!(doc.blocks()[1].id.as_str(), "a");
    }

    #[test]
    fn embedded_documents_are_deduplicated_too() {
        #[derive(Deserialize)]
        struct Request {
            document: Document,
        }
        let request: Request = serde_json::from_value(json!({ "document": [
            { "id": "a", "type": "text", "content": { "heading": "one" } },
            { "id": "a", "type": "text", "content": { "heading": "two" } }
        ] }))
        .unwrap();
        let mut doc = request.document;
        assert_ne!(doc.blocks()[0].id, doc.blocks()[1].id);

        assert!(doc.remove_block(&BlockId::from("a")));
        assert_eq!(doc.len(), 1);
        assert_eq!(serde_json::to_value(&doc).unwrap()[0]["content"]["heading"], "two");
    }

    #[test]
    fn push_replaces_colliding_id() {
        let mut doc = Document::new();
        let first = doc.push(Block::new(BlockId::from("x"), TextBlock::default()));
        let second = doc.push(Block::new(BlockId::from("x"), TextBlock::default()));
        assert_eq!(first.as_str(), "x");
        assert_ne!(second, first);
    }
}
