use bevy::prelude::*;

use super::LocationRecord;

/// Session-long, append-only list of saved locations in insertion order.
///
/// Only main-schedule systems mutate it, which serializes appends.
#[derive(Resource, Debug, Default)]
pub struct LocationStore {
    records: Vec<LocationRecord>,
}

impl LocationStore {
    /// Add a record at the end and return it.
    pub fn append(&mut self, record: LocationRecord) -> &LocationRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Every record appended so far, oldest first.
    pub fn snapshot(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::locations::LocationOrigin;

    fn record(name: &str) -> LocationRecord {
        LocationRecord::new(LatLng::new(1.0, 2.0), name, LocationOrigin::Click)
    }

    #[test]
    fn test_store_starts_empty() {
        let store = LocationStore::default();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = LocationStore::default();
        store.append(record("first"));
        store.append(record("second"));
        store.append(record("third"));

        let names: Vec<&str> = store.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut store = LocationStore::default();
        store.append(record("same"));
        store.append(record("same"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.snapshot()[0], store.snapshot()[1]);
    }

    #[test]
    fn test_append_returns_new_record() {
        let mut store = LocationStore::default();
        let appended = store.append(record("new"));
        assert_eq!(appended.name(), "new");
    }
}
