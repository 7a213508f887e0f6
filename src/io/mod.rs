//! Line-oriented readers for training sets, submissions and prediction files.
//!
//! Every reader comes in two flavors: a `*_from` function working on any
//! [`BufRead`] source, and a path-based wrapper that opens the file and
//! reports failures with the offending path.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub mod error;

pub use error::Error;

fn open(path: &Path) -> Result<BufReader<File>, Error> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::read(path, e))
}

/// Distinct stripped, non-blank lines.
pub fn read_training_set_from<R: BufRead>(reader: R) -> Result<HashSet<String>, Error> {
    let mut set = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            set.insert(trimmed.to_string());
        }
    }
    Ok(set)
}

pub fn read_training_set(path: impl AsRef<Path>) -> Result<HashSet<String>, Error> {
    let path = path.as_ref();
    let set = read_training_set_from(open(path)?).map_err(|e| e.at(path))?;
    tracing::debug!(path = %path.display(), molecules = set.len(), "read training set");
    Ok(set)
}

/// The first `cap` stripped, non-blank lines in file order, duplicates kept.
///
/// Reading stops as soon as the cap is reached.
pub fn read_submission_from<R: BufRead>(reader: R, cap: usize) -> Result<Vec<String>, Error> {
    let mut entries = Vec::new();
    if cap == 0 {
        return Ok(entries);
    }
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        entries.push(trimmed.to_string());
        if entries.len() == cap {
            break;
        }
    }
    Ok(entries)
}

pub fn read_submission(path: impl AsRef<Path>, cap: usize) -> Result<Vec<String>, Error> {
    let path = path.as_ref();
    let entries = read_submission_from(open(path)?, cap).map_err(|e| e.at(path))?;
    tracing::debug!(path = %path.display(), molecules = entries.len(), cap, "read submission");
    Ok(entries)
}

/// Every line as written, without trimming or filtering.
pub fn read_raw_lines_from<R: BufRead>(reader: R) -> Result<Vec<String>, Error> {
    reader.lines().map(|line| line.map_err(Error::from)).collect()
}

pub fn read_raw_lines(path: impl AsRef<Path>) -> Result<Vec<String>, Error> {
    let path = path.as_ref();
    let lines = read_raw_lines_from(open(path)?).map_err(|e| e.at(path))?;
    tracing::debug!(path = %path.display(), lines = lines.len(), "read raw lines");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn training_set_strips_and_deduplicates() {
        let input = Cursor::new("CCO\n  CCO  \n\n   \nCCN\r\n");
        let set = read_training_set_from(input).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("CCO"));
        assert!(set.contains("CCN"));
    }

    #[test]
    fn submission_keeps_order_and_duplicates() {
        let input = Cursor::new("CCO\n\nCCO\n invalid_smiles \nCCN\n");
        let entries = read_submission_from(input, 10_000).unwrap();
        assert_eq!(entries, vec!["CCO", "CCO", "invalid_smiles", "CCN"]);
    }

    #[test]
    fn submission_cap_counts_non_blank_lines() {
        let input = Cursor::new("A\n\nB\nC\nD\n");
        assert_eq!(read_submission_from(input, 2).unwrap(), vec!["A", "B"]);
        let input = Cursor::new("A\n");
        assert!(read_submission_from(input, 0).unwrap().is_empty());
    }

    #[test]
    fn raw_lines_are_untouched() {
        let input = Cursor::new("CCO.CCN\n\n CCBr \n");
        let lines = read_raw_lines_from(input).unwrap();
        assert_eq!(lines, vec!["CCO.CCN", "", " CCBr "]);
    }

    #[test]
    fn path_readers_report_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.txt");
        match read_training_set(&missing) {
            Err(Error::Read { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected read error, got {other:?}"),
        }
        assert!(read_submission(&missing, 10).is_err());
        assert!(read_raw_lines(&missing).is_err());
    }

    #[test]
    fn path_readers_read_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CCO").unwrap();
        writeln!(file, "CCN").unwrap();
        file.flush().unwrap();

        assert_eq!(read_training_set(file.path()).unwrap().len(), 2);
        assert_eq!(read_submission(file.path(), 1).unwrap(), vec!["CCO"]);
        assert_eq!(read_raw_lines(file.path()).unwrap().len(), 2);
    }
}
