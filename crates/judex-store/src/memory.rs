use judex_core::Document;

use crate::{DocumentRepository, Store, StoreError};

/// A repository held entirely in memory. Counts saves so callers can check
/// when the collection was flushed.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    store: Store,
    saves: usize,
}

impl MemoryRepository {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            store: Store::new(documents),
            saves: 0,
        }
    }

    /// The collection as last saved.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl DocumentRepository for MemoryRepository {
    fn load(&mut self) -> Result<Store, StoreError> {
        Ok(self.store.clone())
    }

    fn save(&mut self, store: &Store) -> Result<(), StoreError> {
        self.store = store.clone();
        self.saves += 1;
        Ok(())
    }

    fn find_by_id(&mut self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.store.find_by_id(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use judex_core::{CaseMeta, SummaryEntry};

    use super::*;

    fn doc(id: &str) -> Document {
        Document {
            meta: CaseMeta {
                id: id.to_string(),
                ..CaseMeta::default()
            },
            ..Document::default()
        }
    }

    #[test]
    fn load_returns_a_detached_copy() {
        let mut repo = MemoryRepository::new(vec![doc("a")]);
        let mut store = repo.load().unwrap();
        store.upsert(doc("b"));
        assert_eq!(repo.store().len(), 1);

        repo.save(&store).unwrap();
        assert_eq!(repo.store().len(), 2);
        assert_eq!(repo.saves(), 1);
    }

    #[test]
    fn upsert_through_the_trait_saves() {
        let mut repo = MemoryRepository::new(vec![doc("a")]);
        let mut updated = doc("a");
        updated.ai_summary = Some(vec![SummaryEntry {
            point: "要旨".into(),
            refs: vec![],
        }]);

        assert!(repo.upsert(updated).unwrap());
        assert_eq!(repo.saves(), 1);
        assert!(repo.find_by_id("a").unwrap().unwrap().has_summary());
        assert!(repo.find_by_id("zz").unwrap().is_none());
    }
}
