use crate::types::Anime;

/// Append-only list of anime collected for the current filter set.
///
/// Ids are assumed to be disjoint across pages, as the Jikan API pages a
/// stable ordering. Nothing here checks that: if a page repeats an id, both
/// copies are kept in the order the API returned them.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    items: Vec<Anime>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, items: impl IntoIterator<Item = Anime>) {
        self.items.extend(items);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn all(&self) -> &[Anime] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
