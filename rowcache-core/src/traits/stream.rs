//! Sequential row access contract shared by every matrix variant
//!
//! A row stream is a single-pass, forward-only, restartable sequence of
//! rows. Restarting may be cheap (data already resident) or expensive (file
//! re-scan) but always yields the same rows.

use super::element::MatrixElement;
use crate::row::SparseRow;

/// Forward-only access to the rows of a sparse matrix
///
/// The usual loop is
///
/// ```
/// # use rowcache_core::{MatrixElement, RowStream};
/// # fn sum<M: RowStream>(m: &mut M) -> Result<f64, M::Error> {
/// let mut total = 0.0;
/// m.begin()?;
/// while !m.at_end() {
///     total += m.current_row().iter().map(|e| e.value.to_f64()).sum::<f64>();
///     m.advance()?;
/// }
/// # Ok(total)
/// # }
/// ```
///
/// Rows returned by [`RowStream::current_row`] borrow the stream, so they
/// must be consumed before the next `advance`/`begin`.
pub trait RowStream {
    /// Value type of the entries
    type Element: MatrixElement;

    /// Error raised while moving through the stream
    type Error;

    /// Go to the first row
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// True once every row has been visited
    fn at_end(&self) -> bool;

    /// Go to the next row; a no-op at the end of the stream
    fn advance(&mut self) -> Result<(), Self::Error>;

    /// The row under the cursor, empty when at the end
    fn current_row(&self) -> SparseRow<'_, Self::Element>;

    /// Index of the current row, starting at 0
    fn row_index(&self) -> u32;

    /// Number of rows
    fn nrows(&self) -> u32;

    /// Number of columns
    fn ncols(&self) -> u32;

    /// Total number of entries over all rows
    fn nnz(&self) -> u64;

    /// Visit every row from the beginning, stopping at the first error
    fn try_for_each_row<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        Self: Sized,
        E: From<Self::Error>,
        F: FnMut(u32, SparseRow<'_, Self::Element>) -> Result<(), E>,
    {
        self.begin()?;
        while !self.at_end() {
            f(self.row_index(), self.current_row())?;
            self.advance()?;
        }
        Ok(())
    }

    /// Visit every row from the beginning
    fn for_each_row<F>(&mut self, mut f: F) -> Result<(), Self::Error>
    where
        Self: Sized,
        F: FnMut(u32, SparseRow<'_, Self::Element>),
    {
        self.try_for_each_row(|index, row| {
            f(index, row);
            Ok::<(), Self::Error>(())
        })
    }
}
