//! Typed content blocks making up a project page.
//!
//! Every block kind is declared once in the table passed to `block_table!`.
//! The table generates [`BlockKind`], the [`Payload`] union and all the
//! dispatch between them, so that defaults, editor fields and display
//! templates of a kind can't drift apart.

pub mod list;
pub mod payload;
pub mod schema;

use std::fmt::{Display, Formatter};

use askama::Template;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{ErrorKind, Result};

pub use list::{Blank, EditableList, ListEdit};
pub use payload::*;
pub use schema::{palette, BlockContent, Field, FieldKind, PaletteEntry};

/// Stable identity of a block within its document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// Older documents used millisecond timestamps as ids.
impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => BlockId(s),
            RawId::Number(n) => BlockId(n.to_string()),
        })
    }
}

macro_rules! block_table {
    ($( $variant:ident($payload:ty) => $tag:literal, $label:literal; )*) => {
        /// Closed set of block kinds.
        #[derive(
            Clone,
            Copy,
            Debug,
            PartialEq,
            Eq,
            Hash,
            Serialize,
            Deserialize,
            strum::Display,
            strum::EnumIter,
            strum::EnumString,
            strum::IntoStaticStr,
        )]
        #[serde(rename_all = "snake_case")]
        #[strum(serialize_all = "snake_case")]
        pub enum BlockKind {
            $( $variant, )*
        }

        impl BlockKind {
            /// Human readable name shown in the block palette.
            pub fn label(self) -> &'static str {
                match self {
                    $( BlockKind::$variant => $label, )*
                }
            }

            /// Tag identifying the kind on the wire.
            pub fn tag(self) -> &'static str {
                match self {
                    $( BlockKind::$variant => $tag, )*
                }
            }

            /// Content a freshly inserted block of this kind starts with.
            pub fn default_payload(self) -> Payload {
                match self {
                    $( BlockKind::$variant => Payload::$variant(<$payload>::default()), )*
                }
            }

            pub fn fields(self) -> &'static [Field] {
                match self {
                    $( BlockKind::$variant => <$payload as BlockContent>::FIELDS, )*
                }
            }

            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $( $tag => Some(BlockKind::$variant), )*
                    _ => None,
                }
            }
        }

        /// Block content, shaped according to the block kind.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Payload {
            $( $variant($payload), )*
            /// Content of a kind this version doesn't know about. Kept
            /// verbatim so that saving the document doesn't lose it.
            Unknown { tag: String, content: Value },
        }

        impl Payload {
            /// Kind of the payload, `None` for unknown content.
            pub fn kind(&self) -> Option<BlockKind> {
                match self {
                    $( Payload::$variant(_) => Some(BlockKind::$variant), )*
                    Payload::Unknown { .. } => None,
                }
            }

            pub fn tag(&self) -> &str {
                match self {
                    $( Payload::$variant(_) => $tag, )*
                    Payload::Unknown { tag, .. } => tag,
                }
            }

            /// True when the block has nothing worth displaying. Unknown
            /// content is never displayed.
            pub fn is_blank(&self) -> bool {
                match self {
                    $( Payload::$variant(p) => p.is_blank(), )*
                    Payload::Unknown { .. } => true,
                }
            }

            pub fn to_value(&self) -> Result<Value> {
                Ok(match self {
                    $( Payload::$variant(p) => serde_json::to_value(p)?, )*
                    Payload::Unknown { content, .. } => content.clone(),
                })
            }

            /// Builds the payload for `tag` out of its json content. Unknown
            /// tags are preserved as [`Payload::Unknown`].
            pub fn from_value(tag: &str, content: Value) -> Result<Self> {
                let content = match content {
                    Value::Null => Value::Object(Default::default()),
                    other => other,
                };
                match tag {
                    $( $tag => Ok(Payload::$variant(serde_json::from_value(content)?)), )*
                    _ => Ok(Payload::Unknown {
                        tag: tag.to_string(),
                        content,
                    }),
                }
            }

            /// Nested list stored under `field`.
            pub fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
                match self {
                    $( Payload::$variant(p) => p.list_mut(field), )*
                    Payload::Unknown { .. } => None,
                }
            }

            /// Renders the display markup of the payload.
            pub fn render(&self) -> Result<String> {
                match self {
                    $( Payload::$variant(p) => Ok(p.render()?), )*
                    Payload::Unknown { .. } => Ok(String::new()),
                }
            }
        }

        $(
            impl From<$payload> for Payload {
                fn from(p: $payload) -> Self {
                    Payload::$variant(p)
                }
            }
        )*
    };
}

block_table! {
    Text(TextBlock) => "text", "Text";
    Image(ImageBlock) => "image", "Image";
    List(ListBlock) => "list", "List";
    Quote(QuoteBlock) => "quote", "Quote";
    Gallery(GalleryBlock) => "gallery", "Gallery";
    Video(VideoBlock) => "video", "Video";
    Testimonial(TestimonialBlock) => "testimonial", "Testimonial";
    Stats(StatsBlock) => "stats", "Key figures";
    Timeline(TimelineBlock) => "timeline", "Timeline";
    Faq(FaqBlock) => "faq", "FAQ";
    Cta(CtaBlock) => "cta", "Call to action";
    File(FileBlock) => "file", "File";
    Map(MapBlock) => "map", "Map";
    Award(AwardBlock) => "award", "Award";
    Programme(ProgrammeBlock) => "programme", "Programme";
    Services(ServicesBlock) => "services", "Services";
    Sponsorship(SponsorshipBlock) => "sponsorship", "Sponsorship";
    Impact(ImpactBlock) => "impact", "Impact";
    Team(TeamBlock) => "team", "Team";
}

/// One content unit of a [`Document`](crate::Document).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: BlockId,
    pub payload: Payload,
}

impl Block {
    pub fn new(id: BlockId, payload: impl Into<Payload>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    pub fn kind(&self) -> Option<BlockKind> {
        self.payload.kind()
    }

    /// Shallow-merges `patch` into the payload. The kind of the block never
    /// changes. Unknown content is merged as raw json.
    pub fn merge(&mut self, patch: serde_json::Map<String, Value>) -> Result<()> {
        let mut content = self.payload.to_value()?;
        match &mut content {
            Value::Object(fields) => {
                for (key, value) in patch {
                    fields.insert(key, value);
                }
            }
            _ => content = Value::Object(patch),
        }
        let tag = self.payload.tag().to_string();
        self.payload = Payload::from_value(&tag, content).map_err(|e| {
            ErrorKind::BadInput(format!("patch does not fit `{tag}` block: {}", e.kind))
        })?;
        Ok(())
    }
}

/// Wire form of a block: `{ "id", "type", "content" }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawBlock {
    #[serde(default = "BlockId::generate")]
    id: BlockId,
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    content: Value,
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let payload = match Payload::from_value(&raw.tag, raw.content.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                // Keep malformed content around instead of failing the whole
                // document.
                tracing::warn!(block = %raw.id, tag = %raw.tag, "malformed block content: {e}");
                Payload::Unknown {
                    tag: raw.tag,
                    content: raw.content,
                }
            }
        };
        Block {
            id: raw.id,
            payload,
        }
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let tag = block.payload.tag().to_string();
        let content = match block.payload {
            Payload::Unknown { content, .. } => content,
            // Serializing plain structs of strings and lists into a json value
            // does not fail.
            payload => payload.to_value().unwrap_or(Value::Null),
        };
        RawBlock {
            id: block.id,
            tag,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn table_covers_nineteen_kinds() {
        assert_eq!(BlockKind::iter().count(), 19);
        for kind in BlockKind::iter() {
            assert_eq!(BlockKind::from_tag(kind.tag()), Some(kind));
            assert_eq!(kind.to_string(), kind.tag());
            assert_eq!(kind.default_payload().kind(), Some(kind));
            assert!(!kind.label().is_empty());
        }
    }

    #[test]
    fn defaults_are_blank() {
        for kind in BlockKind::iter() {
            assert!(kind.default_payload().is_blank(), "{kind} default not blank");
        }
    }

    #[test]
    fn block_wire_format() {
        let block = Block::new(
            BlockId::from("b1"),
            TextBlock {
                heading: "Bienvenue".to_string(),
                text: "Hello".to_string(),
            },
        );
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(
            json,
            json!({ "id": "b1", "type": "text", "content": { "heading": "Bienvenue", "text": "Hello" } })
        );
        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let block: Block = serde_json::from_value(
            json!({ "id": 1712345678901u64, "type": "quote", "content": { "text": "Hi" } }),
        )
        .unwrap();
        assert_eq!(block.id.as_str(), "1712345678901");
        assert_eq!(block.kind(), Some(BlockKind::Quote));
    }

    #[test]
    fn unknown_kind_is_preserved_verbatim() {
        let json = json!({ "id": "x", "type": "carousel", "content": { "slides": [1, 2] } });
        let block: Block = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(block.kind(), None);
        assert!(block.payload.is_blank());
        assert_eq!(serde_json::to_value(&block).unwrap(), json);
    }

    #[test]
    fn malformed_known_kind_degrades_to_unknown() {
        let json = json!({ "id": "x", "type": "stats", "content": { "stats": "many" } });
        let block: Block = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(block.kind(), None);
        assert_eq!(serde_json::to_value(&block).unwrap(), json);
    }

    #[test]
    fn missing_content_uses_defaults() {
        let block: Block = serde_json::from_value(json!({ "id": "x", "type": "image" })).unwrap();
        assert_eq!(block.payload, Payload::Image(ImageBlock::default()));
    }

    #[test]
    fn merge_keeps_kind_and_other_fields() {
        let mut block = Block::new(
            BlockId::from("c"),
            CtaBlock {
                title: "Join us".to_string(),
                ..Default::default()
            },
        );
        let patch = json!({ "buttonText": "Donate", "type": "text" });
        block.merge(patch.as_object().unwrap().clone()).unwrap();
        match &block.payload {
            Payload::Cta(cta) => {
                assert_eq!(cta.title, "Join us");
                assert_eq!(cta.button_text, "Donate");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn merge_rejects_mistyped_fields() {
        let mut block = Block::new(BlockId::from("t"), TextBlock::default());
        let patch = json!({ "heading": ["not", "a", "string"] });
        let err = block.merge(patch.as_object().unwrap().clone()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::BadInput(_)));
        assert_eq!(block.payload, Payload::Text(TextBlock::default()));
    }
}
