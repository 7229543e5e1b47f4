//! Position-keyed reconciliation between a backing data array and the
//! visual elements built from it.
//!
//! Element `i` always represents datum `i`. Surviving positions are updated
//! in place and keep their [`ElementId`], new positions are appended, and
//! surplus elements are dropped from the end.

use std::ops::Range;

/// Stable identity of a rendered element, assigned once at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// What to do with each position when syncing elements against data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub update: Range<usize>,
    pub create: Range<usize>,
    pub remove: Range<usize>,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.remove.is_empty()
    }
}

/// Diff `old` elements against `new` data by position.
pub fn reconcile<V, D>(old: &[V], new: &[D]) -> Reconciliation {
    let kept = old.len().min(new.len());
    Reconciliation {
        update: 0..kept,
        create: kept..new.len(),
        remove: kept..old.len(),
    }
}

/// An element paired with its identity.
#[derive(Clone, Debug)]
pub struct Bound<E> {
    pub id: ElementId,
    pub element: E,
}

/// Ordered element list that is synced against data by position.
#[derive(Clone, Debug)]
pub struct ElementList<E> {
    items: Vec<Bound<E>>,
}

impl<E> ElementList<E> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Apply a reconciliation against `data`: update survivors in place,
    /// create the missing tail, drop the surplus.
    pub fn sync<D>(
        &mut self,
        data: &[D],
        ids: &mut IdAllocator,
        mut create: impl FnMut(usize, &D) -> E,
        mut update: impl FnMut(&mut E, usize, &D),
    ) -> Reconciliation {
        let plan = reconcile(&self.items, data);

        self.items.truncate(plan.update.end);
        for (idx, bound) in self.items.iter_mut().enumerate() {
            update(&mut bound.element, idx, &data[idx]);
        }
        for idx in plan.create.clone() {
            self.items.push(Bound {
                id: ids.next(),
                element: create(idx, &data[idx]),
            });
        }

        plan
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Bound<E>> {
        self.items.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Bound<E>> {
        self.items.get_mut(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bound<E>> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Bound<E>> {
        self.items.iter_mut()
    }
}

impl<E> Default for ElementList<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonic source of [`ElementId`]s.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn next(&mut self) -> ElementId {
        let id = ElementId(self.next);
        self.next += 1;
        id
    }
}
