//! Fully resident sparse matrix
//!
//! All rows live in one entry arena; iteration is index arithmetic with no
//! I/O. This is the reference behaviour for [`RowStream`].

use rowcache_core::{ConfigError, MatrixElement, RowSpan, RowStream, SparseEntry, SparseRow};
use std::convert::Infallible;

/// Sparse matrix held entirely in memory
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryMatrix<T> {
    entries: Vec<SparseEntry<T>>,
    rows: Vec<RowSpan>,
    ncols: u32,
    index: usize,
}

impl<T: MatrixElement> InMemoryMatrix<T> {
    /// Empty matrix with at least `ncols` columns
    pub fn new(ncols: u32) -> Self {
        Self {
            entries: Vec::new(),
            rows: Vec::new(),
            ncols,
            index: 0,
        }
    }

    /// Build a matrix from rows of `(column id, value)` pairs
    pub fn from_rows<R, I>(ncols: u32, rows: R) -> Result<Self, ConfigError>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (u32, T)>,
    {
        let mut matrix = Self::new(ncols);
        for row in rows {
            matrix.push_row(row.into_iter().map(SparseEntry::from))?;
        }
        Ok(matrix)
    }

    /// Copy every row of `stream` into memory
    pub fn collect_from<M>(stream: &mut M) -> Result<Self, M::Error>
    where
        M: RowStream<Element = T>,
    {
        let mut matrix = Self::new(stream.ncols());
        matrix.entries.reserve(stream.nnz() as usize);
        matrix.rows.reserve(stream.nrows() as usize);
        stream.for_each_row(|_, row| {
            let offset = matrix.entries.len();
            matrix.entries.extend_from_slice(row.entries());
            matrix.rows.push(RowSpan::new(offset, row.len()));
        })?;
        Ok(matrix)
    }

    /// Append a row
    ///
    /// The column count grows to cover every column id pushed.
    pub fn push_row<I>(&mut self, entries: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = SparseEntry<T>>,
    {
        if self.rows.len() >= u32::MAX as usize {
            return Err(ConfigError::TooManyRows);
        }

        let offset = self.entries.len();
        self.entries.extend(entries);
        let len = self.entries.len() - offset;
        if len > u32::MAX as usize {
            self.entries.truncate(offset);
            return Err(ConfigError::TooManyEntries);
        }

        if let Some(max_id) = self.entries[offset..].iter().map(|e| e.id).max() {
            self.ncols = self.ncols.max(max_id.saturating_add(1));
        }
        self.rows.push(RowSpan::new(offset, len as u32));
        Ok(())
    }

    /// Iterate over all rows without touching the cursor
    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_, T>> + '_ {
        self.rows.iter().map(|span| span.resolve(&self.entries))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: MatrixElement> RowStream for InMemoryMatrix<T> {
    type Element = T;
    type Error = Infallible;

    fn begin(&mut self) -> Result<(), Infallible> {
        self.index = 0;
        Ok(())
    }

    fn at_end(&self) -> bool {
        self.index >= self.rows.len()
    }

    fn advance(&mut self) -> Result<(), Infallible> {
        if !self.at_end() {
            self.index += 1;
        }
        Ok(())
    }

    fn current_row(&self) -> SparseRow<'_, T> {
        self.rows
            .get(self.index)
            .map(|span| span.resolve(&self.entries))
            .unwrap_or_default()
    }

    fn row_index(&self) -> u32 {
        self.index as u32
    }

    fn nrows(&self) -> u32 {
        self.rows.len() as u32
    }

    fn ncols(&self) -> u32 {
        self.ncols
    }

    fn nnz(&self) -> u64 {
        self.entries.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InMemoryMatrix<f64> {
        InMemoryMatrix::from_rows(
            4,
            vec![
                vec![(0, 1.0), (2, 2.0)],
                vec![(3, 3.0)],
                vec![],
                vec![(1, 4.0), (2, 5.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_statistics() {
        let m = sample();
        assert_eq!(m.nrows(), 4);
        assert_eq!(m.ncols(), 4);
        assert_eq!(m.nnz(), 5);
    }

    #[test]
    fn test_iteration() {
        let mut m = sample();
        let mut lens = Vec::new();
        m.begin().unwrap();
        while !m.at_end() {
            assert_eq!(m.row_index() as usize, lens.len());
            lens.push(m.current_row().len());
            m.advance().unwrap();
        }
        assert_eq!(lens, vec![2, 1, 0, 2]);
        assert!(m.current_row().is_empty());

        // advancing past the end stays at the end
        m.advance().unwrap();
        assert_eq!(m.row_index(), 4);
    }

    #[test]
    fn test_restart() {
        let mut m = sample();
        m.begin().unwrap();
        m.advance().unwrap();
        m.advance().unwrap();
        m.begin().unwrap();
        assert_eq!(m.row_index(), 0);
        assert_eq!(m.current_row().entries()[1], SparseEntry::new(2, 2.0));
    }

    #[test]
    fn test_columns_grow_with_ids() {
        let mut m = InMemoryMatrix::<f32>::new(2);
        m.push_row([SparseEntry::new(9, 1.0)]).unwrap();
        assert_eq!(m.ncols(), 10);
    }

    #[test]
    fn test_collect_from_stream() {
        let mut source = sample();
        let copy = InMemoryMatrix::collect_from(&mut source).unwrap();
        assert_eq!(copy.rows().collect::<Vec<_>>(), source.rows().collect::<Vec<_>>());
        assert_eq!(copy.ncols(), source.ncols());
    }

    #[test]
    fn test_empty_matrix() {
        let mut m = InMemoryMatrix::<f64>::new(0);
        m.begin().unwrap();
        assert!(m.at_end());
        assert!(m.is_empty());
        assert_eq!(m.nnz(), 0);
    }
}
