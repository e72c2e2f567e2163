use std::collections::HashMap;

use crate::{PrototypeId, ViewHandle};

/// Per-prototype free lists of retired views.
///
/// Acquisition order is unspecified; any retired handle of the requested prototype may come back.
#[derive(Debug)]
pub struct RecyclePool<N> {
    lists: HashMap<PrototypeId, Vec<ViewHandle<N>>>,
}

impl<N> Default for RecyclePool<N> {
    fn default() -> Self {
        Self {
            lists: HashMap::new(),
        }
    }
}

impl<N> RecyclePool<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure a (possibly empty) list exists for `prototype`.
    pub fn register(&mut self, prototype: &PrototypeId) {
        self.lists.entry(prototype.clone()).or_default();
    }

    pub fn try_acquire(&mut self, prototype: &PrototypeId) -> Option<ViewHandle<N>> {
        let list = self.lists.entry(prototype.clone()).or_default();
        let handle = list.pop();
        if handle.is_some() {
            vtrace!(prototype = prototype.as_str(), "pool acquire");
        }
        handle
    }

    /// Returns a retired handle to the list of its own prototype.
    pub fn release(&mut self, mut handle: ViewHandle<N>) {
        debug_assert!(!handle.is_static(), "static views are never pooled");
        handle.assign(None);
        vtrace!(prototype = handle.prototype().as_str(), "pool release");
        self.lists
            .entry(handle.prototype().clone())
            .or_default()
            .push(handle);
    }

    pub fn pooled_count(&self, prototype: &PrototypeId) -> usize {
        self.lists.get(prototype).map_or(0, Vec::len)
    }

    pub fn total_pooled(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn prototypes(&self) -> impl Iterator<Item = &PrototypeId> {
        self.lists.keys()
    }

    /// Empties every list, handing the handles to the caller (used on teardown).
    pub fn drain(&mut self) -> impl Iterator<Item = ViewHandle<N>> + '_ {
        self.lists.values_mut().flat_map(|list| list.drain(..))
    }
}
