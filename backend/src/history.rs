use shared::{Category, HistoryEntry, HistoryFilter};
use std::sync::{Arc, Mutex};

/// Cap for stored identifications; oldest entries are evicted first.
pub const MAX_HISTORY_ITEMS: usize = 10;

/// Process-wide, volatile store of past identifications, newest-first.
/// Cloning is cheap; all clones share the same entry list.
#[derive(Clone)]
pub struct HistoryStore {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_ITEMS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            capacity,
        }
    }

    /// Inserts at the head and drops the oldest entries beyond capacity.
    pub fn add(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(0, entry);
        entries.truncate(self.capacity);
    }

    /// Returns a snapshot copy in stored (newest-first) order.
    pub fn list(&self, filter: HistoryFilter) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().unwrap();
        let category = match filter {
            HistoryFilter::All => return entries.clone(),
            HistoryFilter::Plant => Category::Plant,
            HistoryFilter::Animal => Category::Animal,
        };
        entries
            .iter()
            .filter(|entry| entry.entry_type == category)
            .cloned()
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<HistoryEntry> {
        let entries = self.entries.lock().unwrap();
        entries.iter().find(|entry| entry.id == id).cloned()
    }

    /// Removes the entry with the given id, reporting whether one existed.
    pub fn delete_by_id(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let initial_len = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != initial_len
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{IdentificationResponse, IdentificationResult};
    use std::collections::HashMap;

    fn entry(id: &str, category: Category) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            timestamp: Utc::now(),
            image_data: "data:image/jpeg;base64,dGVzdA==".to_string(),
            results: IdentificationResponse {
                identification: IdentificationResult {
                    category,
                    name: "Test Species".to_string(),
                    scientific_name: "Testus speciesus".to_string(),
                    confidence: 0.9,
                    description: "A test specimen.".to_string(),
                    additional_info: HashMap::new(),
                    degraded: false,
                },
            },
            entry_type: category,
        }
    }

    #[test]
    fn add_keeps_newest_first() {
        let store = HistoryStore::new();
        store.add(entry("1", Category::Plant));
        store.add(entry("2", Category::Animal));

        let listed = store.list(HistoryFilter::All);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "2");
        assert_eq!(listed[1].id, "1");
    }

    #[test]
    fn add_evicts_oldest_beyond_capacity() {
        let store = HistoryStore::new();
        for i in 0..=MAX_HISTORY_ITEMS {
            store.add(entry(&i.to_string(), Category::Plant));
        }

        assert_eq!(store.len(), MAX_HISTORY_ITEMS);
        let listed = store.list(HistoryFilter::All);
        assert_eq!(listed[0].id, MAX_HISTORY_ITEMS.to_string());
        // Entry "0" was the oldest and must be gone.
        assert!(listed.iter().all(|e| e.id != "0"));
        assert_eq!(listed.last().unwrap().id, "1");
    }

    #[test]
    fn list_filters_by_category_preserving_order() {
        let store = HistoryStore::new();
        store.add(entry("1", Category::Plant));
        store.add(entry("2", Category::Animal));
        store.add(entry("3", Category::Plant));

        let plants = store.list(HistoryFilter::Plant);
        assert_eq!(plants.len(), 2);
        assert_eq!(plants[0].id, "3");
        assert_eq!(plants[1].id, "1");

        let animals = store.list(HistoryFilter::Animal);
        assert_eq!(animals.len(), 1);
        assert_eq!(animals[0].id, "2");
    }

    #[test]
    fn list_returns_a_snapshot() {
        let store = HistoryStore::new();
        store.add(entry("1", Category::Plant));

        let mut listed = store.list(HistoryFilter::All);
        listed.clear();

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = HistoryStore::new();
        store.add(entry("1", Category::Animal));

        store.clear();
        store.clear();

        assert!(store.list(HistoryFilter::All).is_empty());
    }

    #[test]
    fn get_and_delete_by_id() {
        let store = HistoryStore::new();
        store.add(entry("1", Category::Plant));
        store.add(entry("2", Category::Animal));

        assert_eq!(store.get_by_id("1").unwrap().id, "1");
        assert!(store.get_by_id("missing").is_none());

        assert!(store.delete_by_id("1"));
        assert!(!store.delete_by_id("1"));
        assert_eq!(store.len(), 1);
    }
}
