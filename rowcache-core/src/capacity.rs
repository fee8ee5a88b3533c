//! Cache capacity planning
//!
//! Pure arithmetic that turns a byte budget and the dataset statistics from
//! a header into row and entry capacities for the row cache. The row count is
//! derived from the average row length, which over- or under-estimates for
//! skewed row-length distributions; refills still never split a row.

use crate::error::ConfigError;
use crate::format::{RowStreamHeader, ROW_LENGTH_FIELD_SIZE};
use crate::row::{RowSpan, SparseEntry};

/// Bytes charged against the budget for each cached row and entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheCost {
    /// Bytes per cached entry
    pub entry_bytes: u64,
    /// Bytes per cached row descriptor
    pub row_bytes: u64,
}

impl CacheCost {
    /// Cost in terms of the serialized stream (length field + packed entry)
    pub const fn serialized(header: &RowStreamHeader) -> Self {
        Self {
            entry_bytes: header.entry_size() as u64,
            row_bytes: ROW_LENGTH_FIELD_SIZE as u64,
        }
    }

    /// Cost in terms of the in-memory cache buffers for element type `T`
    pub const fn resident<T>() -> Self {
        Self {
            entry_bytes: core::mem::size_of::<SparseEntry<T>>() as u64,
            row_bytes: core::mem::size_of::<RowSpan>() as u64,
        }
    }

    /// Smallest budget that can describe one (empty) row
    pub const fn minimum_budget(&self) -> u64 {
        self.row_bytes
    }
}

/// Row and entry capacities of a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheCapacity {
    /// Maximum number of rows held at once
    pub rows: u32,
    /// Maximum number of entries held at once
    pub entries: u64,
}

impl CacheCapacity {
    /// Plan capacities for `header` within `budget` bytes
    ///
    /// A budget of zero means unbounded: the cache is sized for the whole
    /// dataset. Otherwise the row capacity is the largest `r` with
    /// `r * (avg_entries_per_row * entry_bytes + row_bytes) <= budget`,
    /// clamped to the row count and raised to one so a refill can always
    /// make progress. The entry capacity takes the remaining budget, clamped
    /// to the entry count.
    pub fn plan(
        header: &RowStreamHeader,
        budget: u64,
        cost: CacheCost,
    ) -> Result<Self, ConfigError> {
        if header.nrows == 0 {
            if header.nnz > 0 {
                return Err(ConfigError::EmptyMatrixWithEntries { nnz: header.nnz });
            }
            return Ok(Self::default());
        }

        let capacity = if budget == 0 {
            Self {
                rows: header.nrows,
                entries: header.nnz,
            }
        } else {
            if budget < cost.minimum_budget() {
                return Err(ConfigError::BudgetTooSmall {
                    budget,
                    required: cost.minimum_budget(),
                });
            }

            // floor(budget / (nnz / nrows * entry_bytes + row_bytes)) without
            // going through floating point
            let nrows = header.nrows as u128;
            let dataset_bytes =
                cost.entry_bytes as u128 * header.nnz as u128 + cost.row_bytes as u128 * nrows;
            let rows = if dataset_bytes == 0 {
                nrows
            } else {
                (budget as u128 * nrows / dataset_bytes).min(nrows)
            };
            let rows = (rows as u32).max(1);

            let remaining = budget.saturating_sub(cost.row_bytes * rows as u64);
            let entries = if cost.entry_bytes == 0 {
                header.nnz
            } else {
                (remaining / cost.entry_bytes).min(header.nnz)
            };

            Self { rows, entries }
        };

        if capacity.entries > usize::MAX as u64 {
            return Err(ConfigError::TooManyEntries);
        }
        Ok(capacity)
    }

    /// Shrink the capacity to what `body_bytes` of row data can actually hold
    ///
    /// The header's counts are untrusted until the rows are read, so buffers
    /// are never sized past the stream behind them. A well-formed stream is
    /// never clamped; a corrupt one fails while filling instead.
    pub fn fit_to_stream(self, header: &RowStreamHeader, body_bytes: u64) -> Self {
        let max_rows = body_bytes / ROW_LENGTH_FIELD_SIZE as u64;
        let max_entries = body_bytes / header.entry_size() as u64;
        let rows = if header.nrows == 0 {
            0
        } else {
            (self.rows as u64).min(max_rows.max(1)) as u32
        };
        Self {
            rows,
            entries: self.entries.min(max_entries),
        }
    }

    /// Bytes charged for buffers of this capacity
    pub const fn bytes(&self, cost: CacheCost) -> u64 {
        self.rows as u64 * cost.row_bytes + self.entries * cost.entry_bytes
    }

    /// True when the capacity covers every row and entry of `header`
    pub const fn holds_all(&self, header: &RowStreamHeader) -> bool {
        self.rows >= header.nrows && self.entries >= header.nnz
    }
}
