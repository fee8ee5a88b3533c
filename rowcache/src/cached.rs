//! Disk-backed sparse matrix with a bounded row cache
//!
//! The file is consumed as a forward-only stream. Rows are loaded in
//! refills: each refill overwrites the cache with the longest run of whole
//! rows that fits in the preallocated row and entry buffers. A row is never
//! split across two refills; if the next row does not fit, its length field
//! is pushed back and it starts the following refill.
//!
//! ```text
//! file:   | header | len0 e e | len1 e | len2 e e | ...
//! refill 1:          [ row 0   | row 1 ]             (row 2 would overflow)
//! refill 2:                              [ row 2 | ... ]
//! ```
//!
//! When one refill captures the whole dataset, the next [`RowStream::begin`]
//! drops the reader and the matrix becomes fully resident.

use crate::{CacheConfig, Error, Result};
use rowcache_core::{
    decode_entry, entry_size, CacheCapacity, CacheCost, ConfigError, FormatError, MatrixElement,
    RowSpan, RowStream, RowStreamHeader, SparseEntry, SparseRow, ROW_LENGTH_FIELD_SIZE,
};
use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom},
    path::Path,
};

#[cfg(feature = "mmap")]
use memmap2::Mmap;
#[cfg(feature = "mmap")]
use std::io::Cursor;

/// Whether the matrix still needs its reader
#[derive(Debug)]
enum Residency<R> {
    /// Rows are streamed from the reader on demand
    Streaming(R),
    /// Every row is cached; the reader has been dropped
    FullyResident,
}

/// Read and parse a row-stream header from the current position of `reader`
///
/// A short read is [`FormatError::TruncatedHeader`]; other read failures stay
/// I/O errors. The value width is not checked.
pub fn read_header<R: Read>(reader: &mut R) -> Result<RowStreamHeader> {
    let mut bytes = [0u8; RowStreamHeader::SIZE];
    reader.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::Format(FormatError::TruncatedHeader)
        } else {
            Error::Io(e)
        }
    })?;
    Ok(RowStreamHeader::from_bytes(&bytes)?)
}

/// Allocate a zeroed cache buffer without aborting on huge lengths
fn allocate<E: Default + Clone>(len: u64, too_large: ConfigError) -> Result<Vec<E>> {
    let len = usize::try_from(len).map_err(|_| too_large)?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| too_large)?;
    buf.resize(len, E::default());
    Ok(buf)
}

/// Read exactly `buf.len()` bytes, reporting a short read as a truncated row
fn read_row_bytes<R: Read>(reader: &mut R, buf: &mut [u8], row: u32) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::Format(FormatError::TruncatedRow { row })
        } else {
            Error::Io(e)
        }
    })
}

/// Sparse matrix streamed from a binary row-stream file through a
/// fixed-size cache
///
/// Memory use is bounded by the two buffers planned at construction; they
/// are never resized. Rows returned by [`RowStream::current_row`] point into
/// the entry buffer and are invalidated by the next refill, which the
/// borrow checker enforces.
pub struct CachedMatrix<T, R = BufReader<File>> {
    header: RowStreamHeader,
    capacity: CacheCapacity,
    residency: Residency<R>,
    /// Entry arena, `capacity.entries` long
    entries: Vec<SparseEntry<T>>,
    /// Row descriptors into `entries`, `capacity.rows` long
    rows: Vec<RowSpan>,
    valid_rows: u32,
    valid_entries: usize,
    /// Position of the current row inside `rows`
    cursor: u32,
    /// Logical index of the current row in the dataset
    row_index: u32,
    /// Entries consumed from the reader since the last rewind
    streamed_entries: u64,
    refills: u64,
    entry_buf: Vec<u8>,
}

impl<T: MatrixElement> CachedMatrix<T> {
    /// Open the row-stream file at `path` with a cache of at most
    /// `cache_budget_bytes` (0 keeps the whole dataset resident)
    pub fn open<P: AsRef<Path>>(path: P, cache_budget_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("opening row stream {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), cache_budget_bytes)
    }

    /// Open the file described by `config`
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::open(&config.path, config.cache_budget_bytes)
    }
}

#[cfg(feature = "mmap")]
impl<T: MatrixElement> CachedMatrix<T, Cursor<Mmap>> {
    /// Open the row-stream file at `path` through a memory map
    ///
    /// Rows are still copied into the bounded cache; the map only replaces
    /// buffered reads.
    pub fn open_mmap<P: AsRef<Path>>(path: P, cache_budget_bytes: u64) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the map is read-only and only accessed through the cursor;
        // the file must not be truncated by another process while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_reader(Cursor::new(mmap), cache_budget_bytes)
    }
}

impl<T: MatrixElement, R: Read + Seek> CachedMatrix<T, R> {
    /// Build a cached matrix over any seekable row-stream source
    ///
    /// The header is read and validated, the buffers are allocated and the
    /// first refill is performed, so the matrix starts positioned at row 0.
    pub fn from_reader(mut reader: R, cache_budget_bytes: u64) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = read_header(&mut reader)?;
        header.validate_for::<T>()?;

        let stream_len = reader.seek(SeekFrom::End(0))?;
        let body_bytes = stream_len.saturating_sub(RowStreamHeader::SIZE as u64);
        let capacity =
            CacheCapacity::plan(&header, cache_budget_bytes, CacheCost::resident::<T>())?
                .fit_to_stream(&header, body_bytes);
        if stream_len != header.stream_size() {
            log::warn!(
                "stream is {stream_len} bytes but its header describes {} bytes",
                header.stream_size()
            );
        }
        log::info!(
            "row cache for {} rows / {} entries: {} rows, {} entries in cache",
            header.nrows,
            header.nnz,
            capacity.rows,
            capacity.entries
        );

        let mut matrix = Self {
            header,
            capacity,
            residency: Residency::Streaming(reader),
            entries: allocate(capacity.entries, ConfigError::TooManyEntries)?,
            rows: allocate(capacity.rows as u64, ConfigError::TooManyRows)?,
            valid_rows: 0,
            valid_entries: 0,
            cursor: 0,
            row_index: 0,
            streamed_entries: 0,
            refills: 0,
            entry_buf: vec![0u8; entry_size::<T>()],
        };
        matrix.rewind()?;
        Ok(matrix)
    }

    /// Header of the underlying stream
    pub fn header(&self) -> &RowStreamHeader {
        &self.header
    }

    /// Planned row and entry capacities
    pub fn capacity(&self) -> CacheCapacity {
        self.capacity
    }

    /// True once the reader has been dropped because every row is cached
    pub fn is_fully_resident(&self) -> bool {
        matches!(self.residency, Residency::FullyResident)
    }

    /// Number of refills performed so far
    pub fn refill_count(&self) -> u64 {
        self.refills
    }

    /// Number of rows currently held in the cache
    pub fn cached_rows(&self) -> u32 {
        self.valid_rows
    }

    /// Bytes occupied by the cache buffers
    pub fn resident_bytes(&self) -> u64 {
        (self.rows.len() * std::mem::size_of::<RowSpan>()
            + self.entries.len() * std::mem::size_of::<SparseEntry<T>>()) as u64
    }

    fn clear_cache(&mut self) {
        self.valid_rows = 0;
        self.valid_entries = 0;
        self.cursor = 0;
    }

    /// Seek back to the first row and load a fresh cache
    fn rewind(&mut self) -> Result<()> {
        self.row_index = 0;
        self.clear_cache();
        self.streamed_entries = 0;
        match &mut self.residency {
            Residency::Streaming(reader) => {
                reader.seek(SeekFrom::Start(RowStreamHeader::SIZE as u64))?;
            }
            Residency::FullyResident => {
                return Err(io::Error::new(io::ErrorKind::Other, "row stream already closed").into())
            }
        }
        self.refill()
    }

    /// Reload the cache with the rows following the current one
    ///
    /// On failure the cache is emptied and the current pass ends; a later
    /// `begin` starts over from the file.
    fn refill(&mut self) -> Result<()> {
        if self.row_index >= self.header.nrows {
            return Ok(());
        }
        self.clear_cache();
        self.refills += 1;

        let result = self.fill();
        match &result {
            Ok(()) => log::debug!(
                "refill {}: rows {}..{} ({} entries)",
                self.refills,
                self.row_index,
                self.row_index + self.valid_rows,
                self.valid_entries
            ),
            Err(_) => {
                self.clear_cache();
                self.row_index = self.header.nrows;
            }
        }
        result
    }

    fn fill(&mut self) -> Result<()> {
        let reader = match &mut self.residency {
            Residency::Streaming(reader) => reader,
            Residency::FullyResident => {
                return Err(io::Error::new(io::ErrorKind::Other, "row stream already closed").into())
            }
        };
        let first_row = self.row_index;

        loop {
            if first_row as u64 + self.valid_rows as u64 >= self.header.nrows as u64 {
                break;
            }
            if self.valid_rows as usize >= self.rows.len() {
                break;
            }
            let row = first_row + self.valid_rows;

            let mut len_bytes = [0u8; ROW_LENGTH_FIELD_SIZE];
            read_row_bytes(reader, &mut len_bytes, row)?;
            let len = u32::from_le_bytes(len_bytes);

            if self.streamed_entries + len as u64 > self.header.nnz {
                return Err(FormatError::EntryCountMismatch {
                    declared: self.header.nnz,
                    found: self.streamed_entries + len as u64,
                }
                .into());
            }

            if self.valid_entries as u64 + len as u64 > self.capacity.entries {
                if self.valid_rows == 0 {
                    return Err(ConfigError::RowExceedsCache {
                        row,
                        len,
                        entry_capacity: self.capacity.entries,
                    }
                    .into());
                }
                // leave the row for the next refill
                reader.seek(SeekFrom::Current(-(ROW_LENGTH_FIELD_SIZE as i64)))?;
                log::trace!("row {row} ({len} entries) deferred to next refill");
                break;
            }

            let start = self.valid_entries;
            for slot in &mut self.entries[start..start + len as usize] {
                read_row_bytes(reader, &mut self.entry_buf, row)?;
                *slot = decode_entry(&self.entry_buf);
            }

            self.rows[self.valid_rows as usize] = RowSpan::new(start, len);
            self.valid_rows += 1;
            self.valid_entries += len as usize;
            self.streamed_entries += len as u64;

            if row + 1 == self.header.nrows && self.streamed_entries != self.header.nnz {
                return Err(FormatError::EntryCountMismatch {
                    declared: self.header.nnz,
                    found: self.streamed_entries,
                }
                .into());
            }
        }
        Ok(())
    }
}

impl<T: MatrixElement, R: Read + Seek> RowStream for CachedMatrix<T, R> {
    type Element = T;
    type Error = Error;

    /// Go back to row 0
    ///
    /// If the cache already holds the dataset from row 0 onwards nothing is
    /// read; when that cache covers every row the reader is dropped for
    /// good. Otherwise the reader seeks back to the first row and refills.
    fn begin(&mut self) -> Result<()> {
        if self.row_index == self.cursor && self.valid_rows > 0 {
            self.row_index = 0;
            self.cursor = 0;
            if self.valid_rows == self.header.nrows && !self.is_fully_resident() {
                self.residency = Residency::FullyResident;
                log::info!(
                    "all {} rows resident in cache, closing row stream",
                    self.header.nrows
                );
            }
            return Ok(());
        }
        self.rewind()
    }

    fn at_end(&self) -> bool {
        self.row_index >= self.header.nrows
    }

    fn advance(&mut self) -> Result<()> {
        if self.at_end() {
            return Ok(());
        }
        self.row_index += 1;
        self.cursor += 1;
        if self.cursor >= self.valid_rows {
            self.refill()?;
        }
        Ok(())
    }

    fn current_row(&self) -> SparseRow<'_, T> {
        if self.at_end() || self.cursor >= self.valid_rows {
            return SparseRow::empty();
        }
        self.rows[self.cursor as usize].resolve(&self.entries)
    }

    fn row_index(&self) -> u32 {
        self.row_index
    }

    fn nrows(&self) -> u32 {
        self.header.nrows
    }

    fn ncols(&self) -> u32 {
        self.header.ncols
    }

    fn nnz(&self) -> u64 {
        self.header.nnz
    }
}

impl<T, R> std::fmt::Debug for CachedMatrix<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedMatrix")
            .field("header", &self.header)
            .field("capacity", &self.capacity)
            .field(
                "fully_resident",
                &matches!(self.residency, Residency::FullyResident),
            )
            .field("row_index", &self.row_index)
            .field("cached_rows", &self.valid_rows)
            .field("refills", &self.refills)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{save_binary, write_binary, write_text, InMemoryMatrix};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::io::Cursor;

    type Rows = Vec<Vec<(u32, f64)>>;

    fn encode(rows: &Rows, ncols: u32) -> Vec<u8> {
        let mut m = InMemoryMatrix::from_rows(ncols, rows.clone()).unwrap();
        let mut bytes = Vec::new();
        write_binary(&mut m, &mut bytes).unwrap();
        bytes
    }

    fn open(bytes: Vec<u8>, budget: u64) -> Result<CachedMatrix<f64, Cursor<Vec<u8>>>> {
        CachedMatrix::from_reader(Cursor::new(bytes), budget)
    }

    fn collect<M: RowStream<Element = f64>>(m: &mut M) -> std::result::Result<Rows, M::Error> {
        let mut rows = Vec::new();
        m.for_each_row(|_, row| rows.push(row.iter().map(|e| (e.id, e.value)).collect()))?;
        Ok(rows)
    }

    fn random_rows(rng: &mut StdRng, nrows: usize, ncols: u32, max_len: usize) -> Rows {
        (0..nrows)
            .map(|_| {
                let len = rng.gen_range(0..=max_len);
                (0..len)
                    .map(|_| (rng.gen_range(0..ncols), rng.gen_range(-10.0..10.0)))
                    .collect()
            })
            .collect()
    }

    /// Either every row comes back intact, or the cache was too small for
    /// some row and said so
    fn check_round_trip(bytes: &[u8], budget: u64, rows: &Rows) {
        let result = open(bytes.to_vec(), budget).and_then(|mut m| collect(&mut m));
        match result {
            Ok(got) => assert_eq!(&got, rows, "budget {budget}"),
            Err(Error::Config(ConfigError::RowExceedsCache {
                row,
                len,
                entry_capacity,
            })) => {
                assert_eq!(rows[row as usize].len() as u32, len);
                assert!(len as u64 > entry_capacity);
            }
            Err(e) => panic!("unexpected error with budget {budget}: {e}"),
        }
    }

    fn scenario_rows() -> Rows {
        vec![
            vec![(0, 1.0), (1, 2.0)],
            vec![(2, 3.0)],
            vec![(1, 4.0), (3, 5.0)],
        ]
    }

    #[test]
    fn test_refill_holds_whole_rows_only() {
        let bytes = encode(&scenario_rows(), 4);
        assert_eq!(
            RowStreamHeader::from_bytes(&bytes).unwrap(),
            RowStreamHeader {
                format_id: 2,
                value_width: 8,
                nnz: 5,
                nrows: 3,
                ncols: 4
            }
        );

        // two average rows: 2 * (5/3 entries + 1 row descriptor)
        let cost = CacheCost::resident::<f64>();
        let budget = (2 * (5 * cost.entry_bytes + 3 * cost.row_bytes)).div_ceil(3);
        let mut m = open(bytes, budget).unwrap();
        assert_eq!(m.capacity(), CacheCapacity { rows: 2, entries: 3 });

        // first refill holds rows 0-1, not a partial row 2
        assert_eq!(m.refill_count(), 1);
        assert_eq!(m.cached_rows(), 2);

        m.begin().unwrap();
        assert_eq!(m.refill_count(), 1);
        assert!(!m.is_fully_resident());
        assert_eq!(m.current_row().len(), 2);

        m.advance().unwrap();
        assert_eq!(m.current_row().len(), 1);
        assert_eq!(m.refill_count(), 1);

        // moving past row 1 triggers a refill holding row 2 alone
        m.advance().unwrap();
        assert_eq!(m.refill_count(), 2);
        assert_eq!(m.cached_rows(), 1);
        assert_eq!(m.row_index(), 2);
        assert_eq!(
            m.current_row().entries(),
            &[SparseEntry::new(1, 4.0), SparseEntry::new(3, 5.0)]
        );

        m.advance().unwrap();
        assert!(m.at_end());
        assert_eq!(m.refill_count(), 2);
        assert!(m.current_row().is_empty());
    }

    #[test]
    fn test_row_deferred_when_entries_run_out() {
        let rows: Rows = vec![
            vec![(0, 1.0), (1, 1.0), (2, 1.0)],
            vec![(0, 2.0)],
            vec![(1, 3.0)],
            vec![(2, 4.0)],
        ];
        let bytes = encode(&rows, 3);

        // room for two average rows and three entries
        let cost = CacheCost::resident::<f64>();
        let budget = (6 * cost.entry_bytes + 4 * cost.row_bytes) / 2;
        let mut m = open(bytes, budget).unwrap();
        assert_eq!(m.capacity(), CacheCapacity { rows: 2, entries: 3 });

        // row 1 does not fit next to row 0 and starts the next refill
        assert_eq!(m.cached_rows(), 1);
        assert_eq!(collect(&mut m).unwrap(), rows);
        assert_eq!(m.refill_count(), 3);
    }

    #[test]
    fn test_round_trip_under_many_budgets() {
        let mut rng = StdRng::seed_from_u64(7);
        let cost = CacheCost::resident::<f64>();

        for _ in 0..25 {
            let nrows = rng.gen_range(0..40);
            let rows = random_rows(&mut rng, nrows, 50, 8);
            let bytes = encode(&rows, 50);
            let max_len = rows.iter().map(|r| r.len() as u64).max().unwrap_or(0);

            for budget in [
                cost.row_bytes,
                cost.row_bytes + cost.entry_bytes,
                cost.row_bytes + max_len * cost.entry_bytes,
                3 * (cost.row_bytes + max_len * cost.entry_bytes),
                256,
                1024,
            ] {
                check_round_trip(&bytes, budget, &rows);
            }

            // budgets covering the dataset behave like the in-memory matrix
            for budget in [0, bytes.len() as u64 * 4] {
                let mut m = open(bytes.clone(), budget).unwrap();
                assert_eq!(collect(&mut m).unwrap(), rows);
                assert_eq!(m.refill_count(), u64::from(!rows.is_empty()));
            }
        }
    }

    #[test]
    fn test_restart_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(11);
        let rows = random_rows(&mut rng, 30, 20, 4);
        let bytes = encode(&rows, 20);
        let cost = CacheCost::resident::<f64>();

        for budget in [0, 5 * (cost.row_bytes + 4 * cost.entry_bytes), 10_000] {
            let mut m = open(bytes.clone(), budget).unwrap();
            for stop in [0, 1, 7, 29, 30] {
                m.begin().unwrap();
                for _ in 0..stop {
                    m.advance().unwrap();
                }
                assert_eq!(m.row_index(), stop);
                assert_eq!(collect(&mut m).unwrap(), rows, "budget {budget}, stop {stop}");
            }
        }
    }

    #[test]
    fn test_repeated_begin_keeps_streaming() {
        let mut rng = StdRng::seed_from_u64(3);
        let rows = random_rows(&mut rng, 20, 10, 3);
        let cost = CacheCost::resident::<f64>();
        let mut m = open(encode(&rows, 10), 4 * (cost.row_bytes + 3 * cost.entry_bytes)).unwrap();

        m.begin().unwrap();
        m.begin().unwrap();
        assert!(!m.is_fully_resident());
        assert_eq!(collect(&mut m).unwrap(), rows);
        assert_eq!(collect(&mut m).unwrap(), rows);
        assert!(!m.is_fully_resident());
    }

    #[test]
    fn test_becomes_fully_resident() {
        let rows = scenario_rows();
        let mut m = open(encode(&rows, 4), 0).unwrap();
        assert!(!m.is_fully_resident());

        m.begin().unwrap();
        assert!(m.is_fully_resident());

        for _ in 0..3 {
            assert_eq!(collect(&mut m).unwrap(), rows);
        }
        assert_eq!(m.refill_count(), 1);
    }

    #[test]
    fn test_capacity_bound() {
        let mut rng = StdRng::seed_from_u64(5);
        let rows = random_rows(&mut rng, 50, 30, 6);
        let bytes = encode(&rows, 30);
        let cost = CacheCost::resident::<f64>();

        for budget in [cost.row_bytes, 100, 333, 1000, 4096] {
            let m = open(bytes.clone(), budget);
            if let Ok(m) = m {
                assert!(m.resident_bytes() <= budget, "budget {budget}");
                assert_eq!(m.resident_bytes(), m.capacity().bytes(cost));
            }
        }
    }

    #[test]
    fn test_empty_matrix() {
        let mut m = open(encode(&Vec::new(), 3), 64).unwrap();
        m.begin().unwrap();
        assert!(m.at_end());
        assert_eq!(m.nrows(), 0);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m.nnz(), 0);
        assert!(collect(&mut m).unwrap().is_empty());
    }

    #[test]
    fn test_budget_too_small() {
        let bytes = encode(&scenario_rows(), 4);
        let err = open(bytes.clone(), 1).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::BudgetTooSmall { budget: 1, .. })
        ));

        // cache for one entry cannot take the first two-entry row
        let cost = CacheCost::resident::<f64>();
        let err = open(bytes, cost.row_bytes + cost.entry_bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::RowExceedsCache {
                row: 0,
                len: 2,
                entry_capacity: 1
            })
        ));
        assert_eq!(err.category(), rowcache_core::ErrorCategory::Config);
    }

    #[test]
    fn test_oversized_row_mid_stream() {
        let rows: Rows = vec![
            vec![(0, 1.0)],
            vec![(1, 1.0)],
            (0..6).map(|i| (i, 2.0)).collect(),
        ];
        let cost = CacheCost::resident::<f64>();
        let mut m = open(encode(&rows, 6), cost.row_bytes + 2 * cost.entry_bytes).unwrap();
        assert_eq!(m.capacity(), CacheCapacity { rows: 1, entries: 2 });

        m.advance().unwrap();
        let err = m.advance().unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::RowExceedsCache {
                row: 2,
                len: 6,
                entry_capacity: 2
            })
        ));
        assert!(m.at_end());
        assert!(m.current_row().is_empty());
    }

    #[test]
    fn test_rejects_bad_headers() {
        let bytes = encode(&scenario_rows(), 4);

        let mut wrong_id = bytes.clone();
        wrong_id[0] = 9;
        assert!(matches!(
            open(wrong_id, 0).unwrap_err(),
            Error::Format(FormatError::UnsupportedFormatId { found: 9 })
        ));

        assert!(matches!(
            open(bytes[..10].to_vec(), 0).unwrap_err(),
            Error::Format(FormatError::TruncatedHeader)
        ));

        let mut narrow = InMemoryMatrix::<f32>::from_rows(2, vec![vec![(1, 1.0)]]).unwrap();
        let mut narrow_bytes = Vec::new();
        write_binary(&mut narrow, &mut narrow_bytes).unwrap();
        let err = CachedMatrix::<f64, _>::from_reader(Cursor::new(narrow_bytes), 0).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::ValueWidthMismatch {
                expected: 8,
                found: 4
            })
        ));

        let err = CachedMatrix::<f64>::open("/nonexistent/rows.bin", 0).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_truncated_rows() {
        let rows = scenario_rows();
        let mut bytes = encode(&rows, 4);
        bytes.truncate(bytes.len() - 5);

        assert!(matches!(
            open(bytes.clone(), 0).unwrap_err(),
            Error::Format(FormatError::TruncatedRow { row: 2 })
        ));

        // with a small cache the damage surfaces during iteration
        let cost = CacheCost::resident::<f64>();
        let mut m = open(bytes, cost.row_bytes + 2 * cost.entry_bytes).unwrap();
        let err = collect(&mut m).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::TruncatedRow { row: 2 })));
    }

    #[test]
    fn test_entry_count_disagrees_with_header() {
        let bytes = encode(&scenario_rows(), 4);

        for declared in [4u64, 6] {
            let mut patched = bytes.clone();
            patched[8..16].copy_from_slice(&declared.to_le_bytes());
            let result = open(patched, 0).and_then(|mut m| collect(&mut m));
            assert!(matches!(
                result,
                Err(Error::Format(FormatError::EntryCountMismatch { .. }))
            ));
        }
    }

    #[test]
    fn test_inflated_header_counts_fail_cleanly() {
        let rows: Rows = vec![vec![(0, 1.0)]];
        let bytes = encode(&rows, 1);

        let mut huge_nnz = bytes.clone();
        huge_nnz[8..16].copy_from_slice(&(1u64 << 60).to_le_bytes());
        assert!(matches!(
            open(huge_nnz, 0).unwrap_err(),
            Error::Format(FormatError::EntryCountMismatch {
                declared: 0x1000_0000_0000_0000,
                found: 1
            })
        ));

        let mut huge_nrows = bytes;
        huge_nrows[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            open(huge_nrows, 0).unwrap_err(),
            Error::Format(FormatError::TruncatedRow { row: 1 })
        ));
    }

    /// Reader that fails with something other than end-of-file
    struct Unreadable;

    impl Read for Unreadable {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_read_header_errors() {
        let bytes = encode(&scenario_rows(), 4);
        assert_eq!(
            read_header(&mut &bytes[..]).unwrap(),
            RowStreamHeader::new::<f64>(3, 4, 5)
        );
        assert!(matches!(
            read_header(&mut &bytes[..20]).unwrap_err(),
            Error::Format(FormatError::TruncatedHeader)
        ));
        assert!(matches!(
            read_header(&mut Unreadable).unwrap_err(),
            Error::Io(e) if e.kind() == io::ErrorKind::PermissionDenied
        ));
    }

    #[test]
    fn test_file_backends_match_memory() {
        let mut rng = StdRng::seed_from_u64(21);
        let rows = random_rows(&mut rng, 25, 12, 5);
        let mut memory = InMemoryMatrix::from_rows(12, rows.clone()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.bin");
        save_binary(&mut memory, &path).unwrap();

        let config = CacheConfig::new(&path).with_budget_bytes(300);
        let mut cached = CachedMatrix::<f64>::from_config(&config).unwrap();
        assert_eq!(collect(&mut cached).unwrap(), rows);

        #[cfg(feature = "mmap")]
        {
            let mut mapped = CachedMatrix::<f64, _>::open_mmap(&path, 300).unwrap();
            assert_eq!(collect(&mut mapped).unwrap(), rows);
        }

        // exports only depend on the row contract
        let mut from_memory = Vec::new();
        let mut from_cache = Vec::new();
        write_text(&mut memory, &mut from_memory).unwrap();
        write_text(&mut cached, &mut from_cache).unwrap();
        assert_eq!(from_memory, from_cache);

        let copy = dir.path().join("copy.bin");
        save_binary(&mut cached, &copy).unwrap();
        assert_eq!(std::fs::read(&copy).unwrap(), std::fs::read(&path).unwrap());
    }
}
