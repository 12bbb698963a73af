//! Insertion-ordered hash table keyed by arbitrary values.
//!
//! Constants, class variables and instance variables are all stored in a
//! [`ValueTable`]. Keys are full [`Value`]s rather than identifiers, so the
//! same table serves collaborators that key by numbers, strings or objects.

use rustc_hash::FxHashMap;

use crate::Value;

/// Hash table with O(1) lookup that iterates in insertion order.
///
/// Re-inserting an existing key keeps its original position. Removing a key
/// preserves the relative order of the remaining entries.
///
/// # Example
///
/// ```
/// use corundum_core::{Value, ValueTable};
///
/// let mut table = ValueTable::new();
/// table.insert(Value::symbol("b"), 2);
/// table.insert(Value::Int(7), 1);
/// assert_eq!(table.get(&Value::Int(7)), Some(&1));
///
/// let keys: Vec<_> = table.keys().cloned().collect();
/// assert_eq!(keys, vec![Value::symbol("b"), Value::Int(7)]);
/// ```
#[derive(Debug, Clone)]
pub struct ValueTable<V> {
    entries: Vec<(Value, V)>,
    index: FxHashMap<Value, usize>,
}

impl<V> Default for ValueTable<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<V> ValueTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value for the key if any.
    pub fn insert(&mut self, key: Value, value: V) -> Option<V> {
        if let Some(&slot) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[slot].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Value) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn get_mut(&mut self, key: &Value) -> Option<&mut V> {
        self.index.get(key).map(|&slot| &mut self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.index.contains_key(key)
    }

    /// Remove a key, shifting later entries down to keep insertion order.
    pub fn remove(&mut self, key: &Value) -> Option<V> {
        let slot = self.index.remove(key)?;
        let (_, value) = self.entries.remove(slot);
        for (_, position) in self.index.iter_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> FromIterator<(Value, V)> for ValueTable<V> {
    fn from_iter<I: IntoIterator<Item = (Value, V)>>(iter: I) -> Self {
        let mut table = ValueTable::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reinsert_keeps_position() {
        let mut table = ValueTable::new();
        table.insert(Value::symbol("a"), 1);
        table.insert(Value::symbol("b"), 2);
        assert_eq!(table.insert(Value::symbol("a"), 10), Some(1));

        let entries: Vec<_> = table.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(
            entries,
            vec![(Value::symbol("a"), 10), (Value::symbol("b"), 2)]
        );
    }

    #[test]
    fn remove_preserves_order_of_rest() {
        let mut table: ValueTable<i32> = [
            (Value::Int(1), 1),
            (Value::Int(2), 2),
            (Value::Int(3), 3),
            (Value::Int(4), 4),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.remove(&Value::Int(2)), Some(2));
        assert_eq!(table.remove(&Value::Int(2)), None);
        assert_eq!(table.get(&Value::Int(4)), Some(&4));
        assert_eq!(table.values().copied().collect::<Vec<_>>(), vec![1, 3, 4]);

        table.insert(Value::Int(2), 20);
        assert_eq!(
            table.values().copied().collect::<Vec<_>>(),
            vec![1, 3, 4, 20]
        );
    }

    #[test]
    fn arbitrary_keys() {
        let mut table = ValueTable::new();
        table.insert(Value::float(0.5), "half");
        table.insert(Value::array([Value::Int(1), Value::Nil]), "pair");
        table.insert(Value::str("k"), "string");

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&Value::float(0.5)), Some(&"half"));
        assert_eq!(
            table.get(&Value::array([Value::Int(1), Value::Nil])),
            Some(&"pair")
        );
        assert!(!table.contains_key(&Value::symbol("k")));
    }

    #[test]
    fn get_mut_and_clear() {
        let mut table = ValueTable::new();
        table.insert(Value::Int(1), 1);
        if let Some(v) = table.get_mut(&Value::Int(1)) {
            *v += 1;
        }
        assert_eq!(table.get(&Value::Int(1)), Some(&2));
        table.clear();
        assert!(table.is_empty());
    }
}
