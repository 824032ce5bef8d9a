use std::collections::HashSet;

use judex_core::Document;

/// The full judgment collection, in snapshot order.
///
/// Identifiers are expected to be unique. A snapshot written by an older
/// ingester may still carry duplicates; lookups then see the first record and
/// [`dedup`](Self::dedup) repairs the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    documents: Vec<Document>,
}

/// Outcome of [`Store::dedup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupReport {
    pub initial: usize,
    pub unique: usize,
}

impl DedupReport {
    pub fn removed(&self) -> usize {
        self.initial - self.unique
    }

    pub fn changed(&self) -> bool {
        self.removed() > 0
    }
}

impl Store {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id() == id)
    }

    /// Replace the record with the same identifier in place, or append.
    /// Returns `true` when an existing record was replaced.
    pub fn upsert(&mut self, document: Document) -> bool {
        match self.find_by_id_mut(document.id()) {
            Some(existing) => {
                *existing = document;
                true
            }
            None => {
                self.documents.push(document);
                false
            }
        }
    }

    /// Drop every record whose identifier was already seen, keeping the first
    /// occurrence and the original order.
    pub fn dedup(&mut self) -> DedupReport {
        let initial = self.documents.len();
        let mut seen = HashSet::with_capacity(initial);
        self.documents.retain(|d| seen.insert(d.id().to_string()));
        DedupReport {
            initial,
            unique: self.documents.len(),
        }
    }

    /// Distinct normalised categories, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.documents
            .iter()
            .filter_map(Document::category)
            .filter(|c| !c.is_empty() && seen.insert(*c))
            .collect()
    }

    /// Summarised documents in store order, at most `limit` of them.
    pub fn key_cases(&self, limit: Option<usize>) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|d| d.has_summary())
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }
}

impl FromIterator<Document> for Store {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
