//! Change tracking for user edits to generated fields

use houdini_core::FieldId;
use indexmap::IndexSet;

/// How an edit was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    ValueSet,
    /// Continuous drag, e.g. in a color picker
    Interactive,
    ArrayAdd,
    ArrayRemove,
    ArrayClear,
    Redirected,
    Unspecified,
}

/// Notification that a field was edited
#[derive(Debug, Clone, PartialEq)]
pub struct EditEvent {
    pub field: FieldId,
    pub change: ChangeType,
}

impl EditEvent {
    pub fn new(field: FieldId, change: ChangeType) -> Self {
        Self { field, change }
    }

    pub fn value_set(field: FieldId) -> Self {
        Self::new(field, ChangeType::ValueSet)
    }
}

/// Fields edited since the last push, in edit order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    fields: IndexSet<FieldId>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a field; false if it was already pending
    pub fn insert(&mut self, field: FieldId) -> bool {
        self.fields.insert(field)
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.fields.contains(&field)
    }

    pub fn remove(&mut self, field: FieldId) -> bool {
        self.fields.shift_remove(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.fields.iter().copied()
    }
}

impl FromIterator<FieldId> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = FieldId>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_set_dedups_in_order() {
        let mut set = ChangeSet::new();
        assert!(set.insert(FieldId(3)));
        assert!(set.insert(FieldId(1)));
        assert!(!set.insert(FieldId(3)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![FieldId(3), FieldId(1)]);

        assert!(set.remove(FieldId(3)));
        assert!(!set.contains(FieldId(3)));
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_collect() {
        let set: ChangeSet = [FieldId(0), FieldId(0), FieldId(2)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
