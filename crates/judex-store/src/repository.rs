use judex_core::Document;

use crate::{Store, StoreError};

/// Where the judgment collection lives.
///
/// The collection is loaded and saved wholesale. `find_by_id` and `upsert`
/// default to a load/modify/save round trip; backends with cheaper point
/// access should override them.
pub trait DocumentRepository {
    fn load(&mut self) -> Result<Store, StoreError>;

    fn save(&mut self, store: &Store) -> Result<(), StoreError>;

    fn find_by_id(&mut self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.load()?.find_by_id(id).cloned())
    }

    /// Returns `true` when an existing record was replaced.
    fn upsert(&mut self, document: Document) -> Result<bool, StoreError> {
        let mut store = self.load()?;
        let replaced = store.upsert(document);
        self.save(&store)?;
        Ok(replaced)
    }
}
