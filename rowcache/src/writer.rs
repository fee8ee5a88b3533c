//! Binary and text export for any row stream
//!
//! Both writers drive only the [`RowStream`] contract, so they behave the
//! same on every matrix variant.

use crate::{Error, Result};
use rowcache_core::{encode_entry, entry_size, FormatError, RowStream, RowStreamHeader};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Write `stream` in the binary row-stream format
///
/// The header is taken from the stream's statistics; if the rows that
/// follow disagree with it the bytes are still written but an error is
/// returned.
pub fn write_binary<M, W>(stream: &mut M, writer: W) -> Result<()>
where
    M: RowStream,
    Error: From<M::Error>,
    W: Write,
{
    let mut out = BufWriter::new(writer);
    let header = RowStreamHeader::new::<M::Element>(stream.nrows(), stream.ncols(), stream.nnz());
    out.write_all(&header.to_bytes_array())?;

    let mut entry_buf = vec![0u8; entry_size::<M::Element>()];
    let mut rows_written = 0u64;
    let mut entries_written = 0u64;

    stream.try_for_each_row(|_, row| -> Result<()> {
        out.write_all(&row.len().to_le_bytes())?;
        for entry in row {
            encode_entry(entry, &mut entry_buf);
            out.write_all(&entry_buf)?;
        }
        rows_written += 1;
        entries_written += row.len() as u64;
        Ok(())
    })?;
    out.flush()?;

    if rows_written != header.nrows as u64 {
        return Err(FormatError::RowCountMismatch {
            declared: header.nrows,
            found: rows_written,
        }
        .into());
    }
    if entries_written != header.nnz {
        return Err(FormatError::EntryCountMismatch {
            declared: header.nnz,
            found: entries_written,
        }
        .into());
    }
    Ok(())
}

/// Save `stream` to a binary row-stream file at `path`
pub fn save_binary<M, P>(stream: &mut M, path: P) -> Result<()>
where
    M: RowStream,
    Error: From<M::Error>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    log::info!("writing binary row stream to {}", path.display());
    write_binary(stream, File::create(path)?)
}

/// Write `stream` as text, one row per line of `id:value` tokens
///
/// Tokens are separated by single spaces with no trailing space; an empty
/// row becomes an empty line.
pub fn write_text<M, W>(stream: &mut M, writer: W) -> Result<()>
where
    M: RowStream,
    Error: From<M::Error>,
    W: Write,
{
    let mut out = BufWriter::new(writer);
    stream.try_for_each_row(|_, row| -> Result<()> {
        for (i, entry) in row.iter().enumerate() {
            if i > 0 {
                out.write_all(b" ")?;
            }
            write!(out, "{}:{}", entry.id, entry.value)?;
        }
        out.write_all(b"\n")?;
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}

/// Save `stream` to a text file at `path`
pub fn save_text<M, P>(stream: &mut M, path: P) -> Result<()>
where
    M: RowStream,
    Error: From<M::Error>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    log::info!("writing text rows to {}", path.display());
    write_text(stream, File::create(path)?)
}
