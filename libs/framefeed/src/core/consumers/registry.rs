// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Copy-on-write consumer list.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

/// Ordered consumer list read by output callbacks and written from any
/// thread.
///
/// Writers serialize on a mutex, copy the current list, and publish the new
/// one atomically. Readers load the published list without locking, so a
/// fan-out in progress keeps iterating the list it started with.
pub struct ConsumerRegistry<C: ?Sized> {
    published: ArcSwap<Vec<Arc<C>>>,
    writer: Mutex<()>,
}

impl<C: ?Sized> ConsumerRegistry<C> {
    pub fn new() -> Self {
        Self {
            published: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Replaces every registered consumer with `consumer`.
    pub fn set(&self, consumer: Arc<C>) {
        let _writer = self.writer.lock();
        self.published.store(Arc::new(vec![consumer]));
    }

    /// Appends `consumer` after the existing ones.
    pub fn add(&self, consumer: Arc<C>) {
        let _writer = self.writer.lock();
        let mut next = Vec::clone(&self.published.load());
        next.push(consumer);
        self.published.store(Arc::new(next));
    }

    /// Removes the first registration of `consumer`.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&self, consumer: &Arc<C>) -> bool {
        let _writer = self.writer.lock();
        let current = self.published.load_full();
        let Some(index) = current.iter().position(|c| same_consumer(c, consumer)) else {
            return false;
        };

        let mut next = Vec::clone(&current);
        next.remove(index);
        self.published.store(Arc::new(next));
        true
    }

    pub fn clear(&self) {
        let _writer = self.writer.lock();
        self.published.store(Arc::new(Vec::new()));
    }

    /// The currently published list.
    pub fn snapshot(&self) -> Arc<Vec<Arc<C>>> {
        self.published.load_full()
    }

    pub fn len(&self) -> usize {
        self.published.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.load().is_empty()
    }
}

impl<C: ?Sized> Default for ConsumerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

// Identity, not value equality: the same consumer object may be registered
// more than once, and distinct objects never match.
fn same_consumer<C: ?Sized>(a: &Arc<C>, b: &Arc<C>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
