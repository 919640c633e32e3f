//! HTML Batch Organizing
//!
//! The garden list CSV records which publication batch each garden belongs
//! to. This module builds a name → batch lookup from that CSV and moves the
//! scraped `<name>.html` files from the flat HTML directory into one
//! subdirectory per batch. Files whose stem is not in the CSV stay put and
//! are reported.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;

use crate::dataset;

/// Name → batch lookup built from the garden list.
///
/// Reads by column position: the first column is the batch, the second the
/// garden name (the header row is skipped by the CSV reader). Values are
/// trimmed; rows with either cell missing are dropped.
pub fn load_batch_index(path: &Path) -> Result<FxHashMap<String, String>> {
    let df = dataset::read_csv(path)?;

    let columns = df.get_columns();
    if columns.len() < 2 {
        anyhow::bail!(
            "garden list needs at least 2 columns (batch, name), got {}",
            columns.len()
        );
    }

    let batches = columns[0]
        .cast(&DataType::String)
        .context("batch column is not convertible to string")?;
    let batches = batches.str()?;
    let names = columns[1]
        .cast(&DataType::String)
        .context("name column is not convertible to string")?;
    let names = names.str()?;

    let mut index = FxHashMap::default();
    for idx in 0..df.height() {
        if let (Some(batch), Some(name)) = (batches.get(idx), names.get(idx)) {
            index.insert(name.trim().to_string(), batch.trim().to_string());
        }
    }

    Ok(index)
}

/// Outcome of one organizing run.
#[derive(Debug, Default)]
pub struct OrganizeStats {
    /// Batch label → number of files moved into it.
    pub moved: FxHashMap<String, usize>,
    /// File stems with no batch entry in the CSV.
    pub not_found: Vec<String>,
    /// Files whose move failed.
    pub errors: usize,
}

/// The garden list knows exactly four publication batches.
pub const BATCH_LABELS: [&str; 4] = ["1", "2", "3", "4"];

impl OrganizeStats {
    pub fn total_moved(&self) -> usize {
        self.moved.values().sum()
    }

    /// Per-batch moved counts over the fixed batch range, zeroes included.
    pub fn batch_summary(&self) -> Vec<(&'static str, usize)> {
        BATCH_LABELS
            .iter()
            .map(|&batch| (batch, self.moved.get(batch).copied().unwrap_or(0)))
            .collect()
    }
}

/// Move every `*.html` directly inside `html_dir` into `<html_dir>/<batch>/`.
///
/// Batch directories are created on demand. A failed move is reported and
/// counted but does not abort the run.
pub fn organize_html_files(
    html_dir: &Path,
    index: &FxHashMap<String, String>,
) -> Result<OrganizeStats> {
    let mut stats = OrganizeStats::default();

    let mut files: Vec<_> = fs::read_dir(html_dir)
        .with_context(|| format!("failed to read HTML directory: {}", html_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        })
        .collect();
    files.sort();

    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let Some(batch) = index.get(stem) else {
            println!("warning: no batch entry in CSV for garden '{}'", stem);
            stats.not_found.push(stem.to_string());
            continue;
        };

        let target_dir = html_dir.join(batch);
        let target = target_dir.join(path.file_name().unwrap_or_default());

        let moved = fs::create_dir_all(&target_dir)
            .and_then(|_| fs::rename(&path, &target));
        match moved {
            Ok(()) => {
                println!("moved {}.html to batch {}", stem, batch);
                *stats.moved.entry(batch.clone()).or_insert(0) += 1;
            }
            Err(e) => {
                println!("error moving {}: {}", path.display(), e);
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn index_from_csv(text: &str) -> FxHashMap<String, String> {
        // Mirrors load_batch_index without touching the filesystem
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
            .finish()
            .unwrap();

        let columns = df.get_columns();
        let batches = columns[0].cast(&DataType::String).unwrap();
        let batches = batches.str().unwrap();
        let names = columns[1].cast(&DataType::String).unwrap();
        let names = names.str().unwrap();

        let mut index = FxHashMap::default();
        for idx in 0..df.height() {
            if let (Some(batch), Some(name)) = (batches.get(idx), names.get(idx)) {
                index.insert(name.trim().to_string(), batch.trim().to_string());
            }
        }
        index
    }

    #[test]
    fn test_index_by_column_position() {
        let index = index_from_csv("批次,名称,经度\n1,拙政园,120.6\n2, 留园 ,120.5\n");
        assert_eq!(index.get("拙政园"), Some(&"1".to_string()));
        // Names and batches are trimmed
        assert_eq!(index.get("留园"), Some(&"2".to_string()));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_index_skips_incomplete_rows() {
        let index = index_from_csv("批次,名称\n1,拙政园\n,\n");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_batch_summary_lists_every_batch() {
        let mut stats = OrganizeStats::default();
        stats.moved.insert("2".to_string(), 5);
        stats.moved.insert("4".to_string(), 1);

        // All four batches appear, in order, zeroes included
        assert_eq!(
            stats.batch_summary(),
            vec![("1", 0), ("2", 5), ("3", 0), ("4", 1)]
        );
        assert_eq!(stats.total_moved(), 6);
    }
}
