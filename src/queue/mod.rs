//! Ordered item queue.
//!
//! Every structural mutation takes the current list and installs a freshly
//! built one (see [`OrderedQueue::replace`]), bumping [`OrderedQueue::revision`].
//! Completions never hold a reference into the list; they look their item up
//! by id when they are applied, so a completion racing a reorder or removal
//! either finds its item wherever it now sits or finds nothing.
//!
//! The queue does no IO and no resource management: removed items are handed
//! back to the caller, which releases their previews.

use crate::core::{ItemId, QueueItem, SourceFile};

/// Ordered collection of queue items, keyed by id.
#[derive(Debug, Default)]
pub struct OrderedQueue {
    items: Vec<QueueItem>,
    revision: u64,
}

impl OrderedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of list replacements so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(QueueItem::id).collect()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: ItemId) -> Option<&QueueItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Sum of the source sizes of every queued item.
    pub fn total_bytes(&self) -> u64 {
        self.items.iter().map(QueueItem::original_size).sum()
    }

    /// Ordered copy of the sources, for whole-queue transforms.
    pub fn snapshot(&self) -> Vec<SourceFile> {
        self.items.iter().map(|item| item.source().clone()).collect()
    }

    /// Appends `item` at the tail.
    ///
    /// Ids are generated per item, so a duplicate indicates a caller bug; the
    /// item is handed back untouched in that case.
    pub fn insert(&mut self, item: QueueItem) -> Result<(), QueueItem> {
        if self.contains(item.id()) {
            return Err(item);
        }
        self.replace(|mut items| {
            items.push(item);
            items
        });
        Ok(())
    }

    /// Removes and returns the item with `id`.
    pub fn remove(&mut self, id: ItemId) -> Option<QueueItem> {
        let mut removed = None;
        self.replace(|items| {
            let mut next = Vec::with_capacity(items.len());
            for item in items {
                if item.id() == id {
                    removed = Some(item);
                } else {
                    next.push(item);
                }
            }
            next
        });
        removed
    }

    /// Swaps the item with its predecessor. Returns `false` at the head or
    /// when the id is unknown.
    pub fn move_up(&mut self, id: ItemId) -> bool {
        match self.position(id) {
            Some(index) if index > 0 => {
                self.swap(index - 1, index);
                true
            }
            _ => false,
        }
    }

    /// Swaps the item with its successor. Returns `false` at the tail or when
    /// the id is unknown.
    pub fn move_down(&mut self, id: ItemId) -> bool {
        match self.position(id) {
            Some(index) if index + 1 < self.items.len() => {
                self.swap(index, index + 1);
                true
            }
            _ => false,
        }
    }

    /// Removes every item, returning them in queue order.
    pub fn clear(&mut self) -> Vec<QueueItem> {
        let mut drained = Vec::new();
        self.replace(|items| {
            drained = items;
            Vec::new()
        });
        drained
    }

    /// Applies `f` to the item with `id` in the current list.
    ///
    /// Returns `None` when the id is no longer queued; nothing is inserted.
    pub fn update<R>(&mut self, id: ItemId, f: impl FnOnce(&mut QueueItem) -> R) -> Option<R> {
        let mut f = Some(f);
        let mut outcome = None;
        self.replace(|items| {
            items
                .into_iter()
                .map(|mut item| {
                    if item.id() == id {
                        if let Some(f) = f.take() {
                            outcome = Some(f(&mut item));
                        }
                    }
                    item
                })
                .collect()
        });
        outcome
    }

    fn swap(&mut self, upper: usize, lower: usize) {
        self.replace(|items| {
            let mut next = Vec::with_capacity(items.len());
            let mut held = None;
            for (index, item) in items.into_iter().enumerate() {
                if index == upper {
                    held = Some(item);
                } else if index == lower {
                    next.push(item);
                    next.extend(held.take());
                } else {
                    next.push(item);
                }
            }
            next
        });
    }

    /// Installs the list produced from the current one.
    fn replace(&mut self, f: impl FnOnce(Vec<QueueItem>) -> Vec<QueueItem>) {
        let current = std::mem::take(&mut self.items);
        self.items = f(current);
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Stage;
    use crate::utils::FileKind;

    fn item(name: &str) -> QueueItem {
        QueueItem::new(SourceFile::new(name, None, vec![0u8; 4]), FileKind::Png)
    }

    fn filled(names: &[&str]) -> (OrderedQueue, Vec<ItemId>) {
        let mut queue = OrderedQueue::new();
        let mut ids = Vec::new();
        for name in names {
            let item = item(name);
            ids.push(item.id());
            queue.insert(item).unwrap();
        }
        (queue, ids)
    }

    fn names(queue: &OrderedQueue) -> Vec<&str> {
        queue.items().iter().map(QueueItem::name).collect()
    }

    #[test]
    fn test_insert_appends_in_order() {
        let (queue, ids) = filled(&["a", "b", "c"]);
        assert_eq!(names(&queue), ["a", "b", "c"]);
        assert_eq!(queue.ids(), ids);
        assert_eq!(queue.total_bytes(), 12);
    }

    #[test]
    fn test_insert_then_remove_restores_composition() {
        let (mut queue, ids) = filled(&["a", "b"]);
        let extra = item("x");
        let extra_id = extra.id();

        queue.insert(extra).unwrap();
        let removed = queue.remove(extra_id).unwrap();

        assert_eq!(removed.name(), "x");
        assert_eq!(queue.ids(), ids);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let (mut queue, ids) = filled(&["a"]);
        assert!(queue.remove(ItemId::new()).is_none());
        assert_eq!(queue.ids(), ids);
    }

    #[test]
    fn test_move_up_then_down_restores_order() {
        let (mut queue, ids) = filled(&["a", "b", "c"]);

        assert!(queue.move_up(ids[1]));
        assert_eq!(names(&queue), ["b", "a", "c"]);
        assert!(queue.move_down(ids[1]));
        assert_eq!(queue.ids(), ids);
    }

    #[test]
    fn test_boundary_moves_are_noops() {
        let (mut queue, ids) = filled(&["a", "b", "c"]);
        let revision = queue.revision();

        assert!(!queue.move_up(ids[0]));
        assert!(!queue.move_down(ids[2]));
        assert!(!queue.move_up(ItemId::new()));
        assert_eq!(queue.ids(), ids);
        assert_eq!(queue.revision(), revision);
    }

    #[test]
    fn test_move_keeps_unaffected_items_in_place() {
        let (mut queue, ids) = filled(&["a", "b", "c", "d", "e"]);

        queue.move_down(ids[2]);
        assert_eq!(names(&queue), ["a", "b", "d", "c", "e"]);
    }

    #[test]
    fn test_clear_returns_everything() {
        let (mut queue, ids) = filled(&["a", "b"]);
        let drained = queue.clear();

        assert!(queue.is_empty());
        assert_eq!(drained.iter().map(QueueItem::id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_update_touches_only_matching_item() {
        let (mut queue, ids) = filled(&["a", "b"]);

        let applied = queue.update(ids[1], |item| item.status.begin());
        assert!(matches!(applied, Some(Ok(()))));
        assert_eq!(queue.get(ids[0]).unwrap().status().stage(), Stage::Pending);
        assert_eq!(queue.get(ids[1]).unwrap().status().stage(), Stage::Processing);
    }

    #[test]
    fn test_update_for_removed_id_does_not_reinsert() {
        let (mut queue, ids) = filled(&["a", "b"]);
        queue.remove(ids[0]);

        assert!(queue.update(ids[0], |_| ()).is_none());
        assert_eq!(queue.ids(), vec![ids[1]]);
    }

    #[test]
    fn test_every_mutation_bumps_revision() {
        let (mut queue, ids) = filled(&["a", "b"]);
        let before = queue.revision();

        queue.move_down(ids[0]);
        queue.remove(ids[0]);
        queue.clear();
        assert_eq!(queue.revision(), before + 3);
    }
}
