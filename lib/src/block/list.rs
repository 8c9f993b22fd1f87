//! Ordered collection of editable records nested inside a block payload.
//!
//! Stats, timeline events, faq questions, programme modules and the like are
//! all edited the same way: append an empty record, patch a record in place,
//! remove or move a record by index. [`EditableList`] implements this once,
//! [`ListEdit`] exposes it to the editor without knowing the record type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ErrorKind, Result};

/// Marks records that carry no content.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditableList<T> {
    items: Vec<T>,
}

impl<T> EditableList<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Runs `edit` on the record at `index`.
    pub fn update_with(&mut self, index: usize, edit: impl FnOnce(&mut T)) -> Result<()> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))?;
        edit(item);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(out_of_range(index, self.items.len()).into());
        }
        Ok(self.items.remove(index))
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        reorder_in_place(&mut self.items, from, to)
    }
}

impl<T: Default> EditableList<T> {
    /// List holding a single empty record, the starting point of a freshly
    /// inserted block.
    pub fn with_blank() -> Self {
        Self {
            items: vec![T::default()],
        }
    }

    /// Appends an empty record and returns its index.
    pub fn push_default(&mut self) -> usize {
        self.items.push(T::default());
        self.items.len() - 1
    }
}

impl<T: Blank> EditableList<T> {
    /// Records that carry content, in order.
    pub fn filled(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|item| !item.is_blank())
    }

    pub fn has_content(&self) -> bool {
        self.items.iter().any(|item| !item.is_blank())
    }
}

impl<T> From<Vec<T>> for EditableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for EditableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a EditableList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Type-erased access to a nested list, used by the editor to apply events
/// addressed by field name.
pub trait ListEdit {
    fn len(&self) -> usize;
    fn append_default(&mut self) -> usize;
    /// Shallow-merges `patch` into the record at `index`. Plain values
    /// replace the record entirely.
    fn update(&mut self, index: usize, patch: Value) -> Result<()>;
    fn remove(&mut self, index: usize) -> Result<()>;
    fn move_item(&mut self, from: usize, to: usize) -> Result<()>;
}

impl<T> ListEdit for EditableList<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    fn len(&self) -> usize {
        self.items.len()
    }

    fn append_default(&mut self) -> usize {
        self.push_default()
    }

    fn update(&mut self, index: usize, patch: Value) -> Result<()> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))?;
        *item = merge_into(item, patch)?;
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<()> {
        EditableList::remove(self, index).map(|_| ())
    }

    fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        EditableList::move_item(self, from, to)
    }
}

/// Shallow-merges a json patch into a value of type `T`, going through its
/// json form. Keys of the patch overwrite keys of the current value, other
/// keys are kept.
pub fn merge_into<T: Serialize + DeserializeOwned>(current: &T, patch: Value) -> Result<T> {
    let merged = match (serde_json::to_value(current)?, patch) {
        (Value::Object(mut current), Value::Object(patch)) => {
            for (key, value) in patch {
                current.insert(key, value);
            }
            Value::Object(current)
        }
        (_, replacement) => replacement,
    };
    serde_json::from_value(merged)
        .map_err(|e| ErrorKind::BadInput(format!("patch does not fit the record: {e}")).into())
}

/// Removes the element at `from` and reinserts it at `to`. Both indices are
/// checked against the current length.
pub fn reorder_in_place<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<()> {
    let len = items.len();
    if from >= len {
        return Err(out_of_range(from, len).into());
    }
    if to >= len {
        return Err(out_of_range(to, len).into());
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Pure variant of [`reorder_in_place`], independent of any drag and drop
/// mechanism.
pub fn move_item<T>(mut items: Vec<T>, from: usize, to: usize) -> Result<Vec<T>> {
    reorder_in_place(&mut items, from, to)?;
    Ok(items)
}

fn out_of_range(index: usize, len: usize) -> ErrorKind {
    ErrorKind::BadInput(format!("index {index} out of range for {len} items"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Stat {
        label: String,
        value: String,
    }

    impl Blank for Stat {
        fn is_blank(&self) -> bool {
            self.label.is_blank() && self.value.is_blank()
        }
    }

    fn stat(label: &str, value: &str) -> Stat {
        Stat {
            label: label.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn append_update_remove() {
        let mut list = EditableList::<Stat>::new();
        assert_eq!(list.push_default(), 0);
        assert_eq!(list.push_default(), 1);

        ListEdit::update(&mut list, 1, serde_json::json!({ "label": "Wells" })).unwrap();
        ListEdit::update(&mut list, 1, serde_json::json!({ "value": "12" })).unwrap();
        assert_eq!(list.get(1), Some(&stat("Wells", "12")));

        ListEdit::remove(&mut list, 0).unwrap();
        assert_eq!(list.as_slice(), &[stat("Wells", "12")]);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut list: EditableList<Stat> = vec![stat("a", "1")].into();
        assert!(ListEdit::update(&mut list, 3, serde_json::json!({})).is_err());
        assert!(ListEdit::remove(&mut list, 1).is_err());
        assert!(ListEdit::move_item(&mut list, 0, 1).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn mistyped_patch_is_rejected_and_leaves_record() {
        let mut list: EditableList<Stat> = vec![stat("a", "1")].into();
        let err = ListEdit::update(&mut list, 0, serde_json::json!({ "label": 5 })).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::BadInput(_)));
        assert_eq!(list.get(0), Some(&stat("a", "1")));
    }

    #[test]
    fn plain_strings_are_replaced() {
        let mut list: EditableList<String> = vec!["one".to_string()].into();
        ListEdit::update(&mut list, 0, serde_json::json!("uno")).unwrap();
        assert_eq!(list.as_slice(), &["uno".to_string()]);
    }

    #[test]
    fn move_and_move_back_restores_order() {
        let original = vec!['a', 'b', 'c', 'd'];
        let moved = move_item(original.clone(), 0, 2).unwrap();
        assert_eq!(moved, vec!['b', 'c', 'a', 'd']);
        assert_eq!(move_item(moved, 2, 0).unwrap(), original);
    }

    #[test]
    fn filled_skips_blank_records() {
        let list: EditableList<Stat> = vec![stat("", " "), stat("Kids", "300")].into();
        let filled: Vec<_> = list.filled().collect();
        assert_eq!(filled, vec![&stat("Kids", "300")]);
        assert!(list.has_content());
    }

    #[test]
    fn serializes_as_plain_array() {
        let list: EditableList<Stat> = vec![stat("a", "1")].into();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json, serde_json::json!([{ "label": "a", "value": "1" }]));
    }
}
