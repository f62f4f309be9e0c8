use alloc::collections::BTreeMap;

use crate::models::{Person, PersonId, Role};

/// Key-value storage the allocation engine runs on.
///
/// Every mutation that changes the contents bumps [`MappingStore::version`], so a reader can
/// tell whether anything happened since it last looked.
pub trait MappingStore<K, V> {
    fn get(&self, key: &K) -> Option<V>;

    /// Inserts or replaces the value, returning the previous one.
    fn put(&mut self, key: K, value: V) -> Option<V>;

    fn remove(&mut self, key: &K) -> Option<V>;

    fn list_where(&self, predicate: &dyn Fn(&V) -> bool) -> Vec<V>;

    fn clear(&mut self);

    fn version(&self) -> u64;

    fn list_all(&self) -> Vec<V> {
        self.list_where(&|_: &V| true)
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore<K, V> {
    entries: BTreeMap<K, V>,
    version: u64,
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            version: 0,
        }
    }
}

impl<K: Ord, V> MemoryStore<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues counting from `version`, e.g. after loading the entries from a snapshot.
    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for MemoryStore<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            version: 0,
        }
    }
}

impl<K: Ord, V: Clone> MappingStore<K, V> for MemoryStore<K, V> {
    fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.version += 1;
        self.entries.insert(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.version += 1;
        }
        removed
    }

    fn list_where(&self, predicate: &dyn Fn(&V) -> bool) -> Vec<V> {
        self.entries
            .values()
            .filter(|value| predicate(value))
            .cloned()
            .collect()
    }

    fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.version += 1;
        }
        self.entries.clear();
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Read access to the people known to the system.
pub trait PersonDirectory {
    fn get_person(&self, id: &PersonId) -> Option<Person>;

    fn list_instructors(&self) -> Vec<Person>;

    fn list_students(&self) -> Vec<Person>;
}

impl<S: MappingStore<PersonId, Person>> PersonDirectory for S {
    fn get_person(&self, id: &PersonId) -> Option<Person> {
        self.get(id)
    }

    fn list_instructors(&self) -> Vec<Person> {
        self.list_where(&|person: &Person| person.role() == Role::Instructor)
    }

    fn list_students(&self) -> Vec<Person> {
        self.list_where(&|person: &Person| person.role() == Role::Student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::default_roster;

    #[test]
    fn version_only_moves_on_changes() {
        let mut store = MemoryStore::<u32, &str>::new();
        assert_eq!(store.version(), 0);
        assert_eq!(store.put(1, "one"), None);
        assert_eq!(store.put(1, "uno"), Some("one"));
        assert_eq!(store.version(), 2);
        assert_eq!(store.remove(&7), None);
        assert_eq!(store.version(), 2);
        assert_eq!(store.remove(&1), Some("uno"));
        assert_eq!(store.version(), 3);
        store.clear();
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn restored_store_keeps_counting() {
        let mut store = [(1_u32, 1_u32)]
            .into_iter()
            .collect::<MemoryStore<_, _>>()
            .with_version(41);
        assert_eq!(store.version(), 41);
        store.put(2, 4);
        assert_eq!(store.version(), 42);
    }

    #[test]
    fn list_where_filters_values() {
        let store: MemoryStore<u32, u32> = (0..10).map(|n| (n, n * n)).collect();
        assert_eq!(store.list_where(&|value: &u32| value % 2 == 1), vec![1, 9, 25, 49, 81]);
        assert_eq!(store.list_all().len(), 10);
    }

    #[test]
    fn directory_splits_roster_by_role() {
        let store: MemoryStore<PersonId, Person> = default_roster()
            .into_iter()
            .map(|person| (person.id.clone(), person))
            .collect();
        assert_eq!(store.list_instructors().len(), 4);
        assert_eq!(store.list_students().len(), 4);
        assert_eq!(
            store.get_person(&PersonId::from("admin")).map(|p| p.role()),
            Some(Role::Administrator)
        );
        assert!(store.get_person(&PersonId::from("nobody")).is_none());
    }
}
