use std::sync::Arc;

use indexmap::IndexMap;

use super::source::Record;

/// Ordered set of records accumulated across pages, unique by id.
#[derive(Debug, Clone)]
pub struct ItemCollection<R: Record> {
    items: IndexMap<R::Id, R>,
}

impl<R: Record> Default for ItemCollection<R> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<R: Record> ItemCollection<R> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the records of a page, skipping ids that were already seen.
    ///
    /// Records keep their received order and the first occurrence of an id wins, including for
    /// duplicates inside `page` itself. Returns how many records were appended.
    pub fn merge(&mut self, page: impl IntoIterator<Item = R>) -> usize {
        let before = self.items.len();
        for record in page {
            self.items.entry(record.id()).or_insert(record);
        }
        self.items.len() - before
    }

    /// Drop every accumulated record.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of accumulated records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no record has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a record with `id` is already present.
    pub fn contains(&self, id: &R::Id) -> bool {
        self.items.contains_key(id)
    }

    /// Immutable copy of the records in insertion order, suitable for publishing.
    pub fn snapshot(&self) -> Arc<[R]> {
        self.items.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    impl Record for Row {
        type Id = u32;
        type Filter = ();

        const KIND: &'static str = "row";

        fn id(&self) -> u32 {
            self.id
        }
    }

    fn row(id: u32, label: &'static str) -> Row {
        Row { id, label }
    }

    fn ids(collection: &ItemCollection<Row>) -> Vec<u32> {
        collection.snapshot().iter().map(|row| row.id).collect()
    }

    #[test]
    fn overlapping_pages_keep_first_seen_order() {
        let mut collection = ItemCollection::new();
        assert_eq!(collection.merge(vec![row(1, "a"), row(2, "b")]), 2);
        assert_eq!(collection.merge(vec![row(2, "b'"), row(3, "c")]), 1);

        assert_eq!(ids(&collection), vec![1, 2, 3]);
        // The earlier copy of a duplicated record is the one kept.
        assert_eq!(collection.snapshot()[1].label, "b");
    }

    #[test]
    fn refetching_the_same_page_is_idempotent() {
        let mut collection = ItemCollection::new();
        let page = vec![row(5, "e"), row(4, "d")];
        collection.merge(page.clone());
        assert_eq!(collection.merge(page), 0);
        assert_eq!(ids(&collection), vec![5, 4]);
    }

    #[test]
    fn duplicates_within_one_page_collapse() {
        let mut collection = ItemCollection::new();
        assert_eq!(
            collection.merge(vec![row(7, "x"), row(8, "y"), row(7, "z")]),
            2
        );
        assert_eq!(ids(&collection), vec![7, 8]);
        assert!(collection.contains(&7));
    }

    #[test]
    fn clear_empties_the_collection() {
        let mut collection = ItemCollection::new();
        collection.merge(vec![row(1, "a")]);
        collection.clear();
        assert!(collection.is_empty());
        assert_eq!(collection.len(), 0);
    }
}
