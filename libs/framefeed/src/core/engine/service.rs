// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;
use std::marker::PhantomData;

/// Typed key for an object the host provides to graph nodes, such as a
/// shared inference context or an asset manager.
///
/// The type parameter ties the key to the object type, so a service can
/// only be bound to an object of the type its consumers expect.
pub struct GraphService<T: ?Sized> {
    name: &'static str,
    _object: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> GraphService<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _object: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: ?Sized> Clone for GraphService<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for GraphService<T> {}

impl<T: ?Sized> fmt::Debug for GraphService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GraphService").field(&self.name).finish()
    }
}
