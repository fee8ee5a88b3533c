//! Sparse entry and row value types
//!
//! Rows never own their entries. A matrix keeps all entries in one arena and
//! describes each row as a [`RowSpan`] into it; a [`SparseRow`] is the
//! borrowed view obtained by resolving a span against the arena.

/// A single (column id, value) pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseEntry<T> {
    /// Column index
    pub id: u32,
    /// Stored value
    pub value: T,
}

impl<T> SparseEntry<T> {
    pub const fn new(id: u32, value: T) -> Self {
        Self { id, value }
    }
}

impl<T> From<(u32, T)> for SparseEntry<T> {
    fn from((id, value): (u32, T)) -> Self {
        Self { id, value }
    }
}

/// Location of one row inside an entry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowSpan {
    /// Index of the row's first entry in the arena
    pub offset: usize,
    /// Number of entries in the row
    pub len: u32,
}

impl RowSpan {
    pub const fn new(offset: usize, len: u32) -> Self {
        Self { offset, len }
    }

    /// One past the last arena index covered by this row
    pub const fn end(&self) -> usize {
        self.offset + self.len as usize
    }

    /// Borrow the row's entries out of `arena`
    ///
    /// Panics if the span does not lie inside the arena; spans are only ever
    /// created by the matrix that owns the arena.
    pub fn resolve<'a, T>(&self, arena: &'a [SparseEntry<T>]) -> SparseRow<'a, T> {
        SparseRow::new(&arena[self.offset..self.end()])
    }
}

/// Borrowed view of one sparse row
///
/// The view borrows the matrix it came from, so it cannot be held across a
/// call that advances or restarts the matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseRow<'a, T> {
    entries: &'a [SparseEntry<T>],
}

impl<'a, T> SparseRow<'a, T> {
    pub const fn new(entries: &'a [SparseEntry<T>]) -> Self {
        Self { entries }
    }

    /// A row with no entries
    pub const fn empty() -> Self {
        Self { entries: &[] }
    }

    /// Number of entries, as stored in the row length field
    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &'a [SparseEntry<T>] {
        self.entries
    }

    pub fn iter(&self) -> core::slice::Iter<'a, SparseEntry<T>> {
        self.entries.iter()
    }
}

impl<T> Default for SparseRow<'_, T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, T> IntoIterator for SparseRow<'a, T> {
    type Item = &'a SparseEntry<T>;
    type IntoIter = core::slice::Iter<'a, SparseEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
