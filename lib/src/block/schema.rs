use askama::Template;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::list::ListEdit;
use super::BlockKind;

/// Shape of a single editable field, from which the editor derives its form
/// control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single line of text.
    Line,
    /// Free text spanning multiple lines.
    Multiline,
    /// Link to an external resource.
    Url,
    /// Reference to an uploaded image.
    Image,
    /// Ordered list of plain strings.
    Strings,
    /// Ordered list of records with the given fields.
    Records(&'static [Field]),
}

impl FieldKind {
    pub fn is_list(&self) -> bool {
        matches!(self, FieldKind::Strings | FieldKind::Records(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Name of the field on the wire.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind }
    }
}

/// Contract every block payload fulfills.
///
/// The payload is its own display template, its `Default` is the value a
/// freshly inserted block starts with, and `FIELDS` drives the editor form.
pub trait BlockContent: Default + Serialize + DeserializeOwned + Template {
    const FIELDS: &'static [Field];

    /// True when every field the block needs to be displayed is empty.
    fn is_blank(&self) -> bool;

    /// Nested list stored under the field with given wire name.
    fn list_mut(&mut self, _field: &str) -> Option<&mut dyn ListEdit> {
        None
    }
}

/// Entry of the block palette shown to operators.
#[derive(Clone, Debug, Serialize)]
pub struct PaletteEntry {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub label: &'static str,
    pub fields: &'static [Field],
    pub default: serde_json::Value,
}

/// Lists every block kind together with its label, fields and default
/// content.
pub fn palette() -> crate::Result<Vec<PaletteEntry>> {
    use strum::IntoEnumIterator;

    BlockKind::iter()
        .map(|kind| {
            Ok(PaletteEntry {
                kind,
                label: kind.label(),
                fields: kind.fields(),
                default: kind.default_payload().to_value()?,
            })
        })
        .collect()
}

/// Finds the descriptor of a field for the given kind.
pub fn field(kind: BlockKind, name: &str) -> Option<&'static Field> {
    kind.fields().iter().find(|f| f.name == name)
}
