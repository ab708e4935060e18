//! Append-only storage with phantom-typed indices, so that an index into the
//! edge store cannot be confused with an index into the cell store.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Index into a [`TypedVec<T>`]. Plain `usize` under the hood; the phantom
/// parameter ties it to the store it came from.
pub struct TypedIndex<T> {
    index: usize,
    phantom: PhantomData<T>,
}

impl<T> TypedIndex<T> {
    pub fn new(index: usize) -> Self {
        TypedIndex {
            index,
            phantom: PhantomData,
        }
    }

    /// The raw position, for lock-step lookups across parallel stores.
    pub fn raw(self) -> usize {
        self.index
    }
}

// The derives would bound T, which the phantom parameter does not require.
impl<T> Copy for TypedIndex<T> {}

impl<T> Clone for TypedIndex<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for TypedIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for TypedIndex<T> {}

impl<T> Hash for TypedIndex<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for TypedIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

/// A `Vec` that hands out [`TypedIndex`] handles. Entries are never removed,
/// so handles stay valid for the life of the store.
pub struct TypedVec<T>(Vec<T>);

// The derive would bound T: Default, which an empty Vec does not require.
impl<T> Default for TypedVec<T> {
    fn default() -> Self {
        TypedVec(Vec::new())
    }
}

impl<T> TypedVec<T> {
    pub fn new() -> Self {
        TypedVec(Vec::new())
    }

    pub fn insert(&mut self, item: T) -> TypedIndex<T> {
        self.0.push(item);
        TypedIndex::new(self.0.len() - 1)
    }

    pub fn get(&self, index: TypedIndex<T>) -> Option<&T> {
        self.0.get(index.index)
    }

    pub fn get_mut(&mut self, index: TypedIndex<T>) -> Option<&mut T> {
        self.0.get_mut(index.index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypedIndex<T>, &T)> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, item)| (TypedIndex::new(index), item))
    }

    pub fn indices(&self) -> impl Iterator<Item = TypedIndex<T>> {
        (0..self.0.len()).map(TypedIndex::new)
    }
}
