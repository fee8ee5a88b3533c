//! Loader for the text row format written by [`crate::write_text`]

use crate::{InMemoryMatrix, Result};
use rowcache_core::{FormatError, MatrixElement, SparseEntry};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Parse one `id:value` token
fn parse_entry<T: MatrixElement>(token: &str) -> Option<SparseEntry<T>> {
    let (id, value) = token.split_once(':')?;
    Some(SparseEntry::new(id.parse().ok()?, value.parse().ok()?))
}

/// Read text rows into memory
///
/// Every line is one row; an empty line is an empty row. The column count
/// is at least `ncols` and grows to cover the largest id seen.
pub fn read_text<T, R>(reader: R, ncols: u32) -> Result<InMemoryMatrix<T>>
where
    T: MatrixElement,
    R: BufRead,
{
    let mut matrix = InMemoryMatrix::new(ncols);
    let mut row = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        row.clear();
        for token in line.split_whitespace() {
            let entry = parse_entry(token).ok_or(FormatError::MalformedText { line: i + 1 })?;
            row.push(entry);
        }
        matrix.push_row(row.iter().copied())?;
    }

    Ok(matrix)
}

/// Load a text row file from `path`
pub fn load_text<T, P>(path: P, ncols: u32) -> Result<InMemoryMatrix<T>>
where
    T: MatrixElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    log::info!("reading text rows from {}", path.display());
    read_text(BufReader::new(File::open(path)?), ncols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{write_text, Error};
    use rowcache_core::RowStream;

    #[test]
    fn test_parse_rows() {
        let text = "0:1.5 2:-2\n3:0.25\n\n1:4 2:5\n";
        let m: InMemoryMatrix<f64> = read_text(text.as_bytes(), 0).unwrap();

        assert_eq!(m.nrows(), 4);
        assert_eq!(m.ncols(), 4);
        assert_eq!(m.nnz(), 5);
        let lens: Vec<u32> = m.rows().map(|r| r.len()).collect();
        assert_eq!(lens, vec![2, 1, 0, 2]);
    }

    #[test]
    fn test_text_round_trip() {
        let text = "0:1.5 2:-2\n3:0.25\n\n1:4 2:5\n";
        let mut m: InMemoryMatrix<f32> = read_text(text.as_bytes(), 8).unwrap();
        assert_eq!(m.ncols(), 8);

        let mut out = Vec::new();
        write_text(&mut m, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn test_malformed_lines() {
        for text in ["1:2\n3\n", "1:2\nx:1\n", "1:2\n4:abc\n"] {
            let err = read_text::<f64, _>(text.as_bytes(), 0).unwrap_err();
            assert!(matches!(
                err,
                Error::Format(FormatError::MalformedText { line: 2 })
            ));
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_text::<f64, _>("/nonexistent/rows.txt", 0).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
