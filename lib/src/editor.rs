//! Block editor.
//!
//! Editor views are derived from the field descriptors of each block kind.
//! An operator's input arrives as an [`EditorEvent`] which is translated into
//! a payload update, or into an operation on one of the nested lists.

use askama::Template;
use serde_json::{Map, Value};

use crate::block::{schema, Block, BlockId, BlockKind, Field, FieldKind};
use crate::document::Document;
use crate::{ErrorKind, Result};

/// Single operator input addressed to one block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorEvent {
    /// Replaces the value of a plain field.
    Set { field: String, value: Value },
    /// Shallow-merges several fields at once.
    Patch { fields: Map<String, Value> },
    /// Appends an empty record to a nested list.
    Append { field: String },
    /// Merges `value` into the record at `index` of a nested list.
    Edit {
        field: String,
        index: usize,
        value: Value,
    },
    /// Removes the record at `index` of a nested list.
    Remove { field: String, index: usize },
    /// Moves a record within a nested list.
    Move { field: String, from: usize, to: usize },
}

/// Applies `event` to `block`. Events naming fields the block kind doesn't
/// have are rejected.
pub fn apply(block: &mut Block, event: EditorEvent) -> Result<()> {
    match event {
        EditorEvent::Set { field, value } => {
            check_field(block, &field, false)?;
            let mut patch = Map::new();
            patch.insert(field, value);
            block.merge(patch)
        }
        EditorEvent::Patch { fields } => {
            for name in fields.keys() {
                check_field(block, name, false)?;
            }
            block.merge(fields)
        }
        EditorEvent::Append { field } => {
            list_of(block, &field)?.append_default();
            Ok(())
        }
        EditorEvent::Edit {
            field,
            index,
            value,
        } => list_of(block, &field)?.update(index, value),
        EditorEvent::Remove { field, index } => list_of(block, &field)?.remove(index),
        EditorEvent::Move { field, from, to } => list_of(block, &field)?.move_item(from, to),
    }
}

fn check_field(block: &Block, name: &str, list: bool) -> Result<()> {
    let Some(kind) = block.kind() else {
        // Content of unknown kinds is edited as raw json.
        return Ok(());
    };
    match schema::field(kind, name) {
        Some(field) if field.kind.is_list() == list => Ok(()),
        Some(_) if list => {
            Err(ErrorKind::BadInput(format!("`{name}` of `{kind}` block is not a list")).into())
        }
        Some(_) => Err(ErrorKind::BadInput(format!(
            "`{name}` of `{kind}` block is a list, edit its items instead"
        ))
        .into()),
        None => Err(ErrorKind::BadInput(format!("`{kind}` block has no field `{name}`")).into()),
    }
}

fn list_of<'b>(block: &'b mut Block, field: &str) -> Result<&'b mut dyn crate::block::ListEdit> {
    check_field(block, field, true)?;
    let tag = block.payload.tag().to_string();
    block
        .payload
        .list_mut(field)
        .ok_or_else(|| ErrorKind::BadInput(format!("`{tag}` block has no list `{field}`")).into())
}

/// Form control a field is edited with.
fn control(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Line => "line",
        FieldKind::Multiline => "multiline",
        FieldKind::Url => "url",
        FieldKind::Image => "image",
        FieldKind::Strings => "strings",
        FieldKind::Records(_) => "records",
    }
}

/// Current value of a field as shown in the form.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Strings(Vec<String>),
    Records(Vec<Vec<FieldView>>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub control: &'static str,
    pub value: FieldValue,
}

impl FieldView {
    fn build(field: &Field, value: Option<&Value>) -> Self {
        let value = match field.kind {
            FieldKind::Strings => FieldValue::Strings(
                value
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(text_of).collect())
                    .unwrap_or_default(),
            ),
            FieldKind::Records(sub_fields) => FieldValue::Records(
                value
                    .and_then(Value::as_array)
                    .map(|records| {
                        records
                            .iter()
                            .map(|record| {
                                sub_fields
                                    .iter()
                                    .map(|f| FieldView::build(f, record.get(f.name)))
                                    .collect()
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            _ => FieldValue::Text(value.map(text_of).unwrap_or_default()),
        };
        Self {
            name: field.name,
            label: field.label,
            control: control(&field.kind),
            value,
        }
    }

    pub fn text(&self) -> &str {
        match &self.value {
            FieldValue::Text(s) => s,
            _ => "",
        }
    }

    pub fn strings(&self) -> &[String] {
        match &self.value {
            FieldValue::Strings(items) => items,
            _ => &[],
        }
    }

    pub fn records(&self) -> &[Vec<FieldView>] {
        match &self.value {
            FieldValue::Records(records) => records,
            _ => &[],
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Editor form of a single block.
#[derive(Clone, Debug, PartialEq, Serialize, Template)]
#[template(path = "editor/block.html")]
pub struct FormView {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub tag: String,
    pub label: &'static str,
    /// Blocks of unknown kinds can't be edited through a form.
    pub editable: bool,
    pub fields: Vec<FieldView>,
}

impl FormView {
    pub fn for_block(block: &Block) -> Result<Self> {
        let content = block.payload.to_value()?;
        let (label, fields) = match block.kind() {
            Some(kind) => (
                kind.label(),
                kind.fields()
                    .iter()
                    .map(|f| FieldView::build(f, content.get(f.name)))
                    .collect(),
            ),
            None => ("Unsupported block", vec![]),
        };
        Ok(Self {
            id: block.id.clone(),
            tag: block.payload.tag().to_string(),
            label,
            editable: block.kind().is_some(),
            fields,
        })
    }
}

/// Builds the forms of every block in document order.
pub fn forms(document: &Document) -> Result<Vec<FormView>> {
    document.iter().map(FormView::for_block).collect()
}

/// Renders the editor form markup of every block in document order.
pub fn render_forms(document: &Document) -> Result<String> {
    let mut out = String::new();
    for form in forms(document)? {
        out.push_str(&form.render()?);
    }
    Ok(out)
}

/// Kinds offered to the operator when inserting a new block.
pub fn kinds() -> Vec<(BlockKind, &'static str)> {
    use strum::IntoEnumIterator;
    BlockKind::iter().map(|k| (k, k.label())).collect()
}
