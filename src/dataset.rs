//! Dataset Loading and Output
//!
//! Loads the garden list and the national heritage-site register from CSV
//! using Polars, extracts them into plain record structs for the resolver,
//! and writes the enriched garden table back out as BOM-prefixed UTF-8 CSV.
//!
//! Both inputs go through the strict UTF-8 → GBK fallback in [`crate::encoding`]
//! before parsing, so legacy spreadsheet exports load without mangling.

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::encoding;

/// Garden list column: name.
pub const COL_NAME: &str = "名称";
/// Garden list column: longitude in decimal degrees.
pub const COL_LON: &str = "经度";
/// Garden list column: latitude in decimal degrees.
pub const COL_LAT: &str = "纬度";
/// Garden list column: free-text description.
pub const COL_DESC: &str = "描述";
/// Output column added by the resolver: heritage-protection level.
pub const COL_LEVEL: &str = "文保单位级别";

/// One garden row, extracted for per-record matching.
///
/// Coordinates are `None` when the cell is missing or unparseable; the
/// resolver treats that as "no location match", not an error.
#[derive(Debug, Clone)]
pub struct GardenRecord {
    pub name: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub description: Option<String>,
}

/// One entry of the national heritage-site register.
///
/// Sites with missing coordinates still participate in name matching but are
/// infinitely far for proximity matching.
#[derive(Debug, Clone)]
pub struct HeritageSite {
    pub name: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// Garden table: the original frame (kept for output) plus extracted records.
pub struct GardenTable {
    pub df: DataFrame,
    pub records: Vec<GardenRecord>,
}

/// Load the garden list CSV.
pub fn load_gardens(path: &Path) -> Result<GardenTable> {
    let df = read_csv(path)?;

    let names = string_column(&df, COL_NAME)?;
    let lons = float_column(&df, COL_LON)?;
    let lats = float_column(&df, COL_LAT)?;
    let descs = string_column(&df, COL_DESC)?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        records.push(GardenRecord {
            name: names[idx].clone().unwrap_or_default(),
            longitude: lons[idx],
            latitude: lats[idx],
            description: descs[idx].clone(),
        });
    }

    Ok(GardenTable { df, records })
}

/// Load the heritage-site register CSV.
pub fn load_sites(path: &Path) -> Result<Vec<HeritageSite>> {
    let df = read_csv(path)?;

    let names = string_column(&df, COL_NAME)?;
    let lons = float_column(&df, COL_LON)?;
    let lats = float_column(&df, COL_LAT)?;

    let mut sites = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        sites.push(HeritageSite {
            name: names[idx].clone().unwrap_or_default(),
            longitude: lons[idx],
            latitude: lats[idx],
        });
    }

    Ok(sites)
}

/// Append the resolved level column and write BOM-prefixed UTF-8 CSV.
pub fn write_with_levels(
    mut df: DataFrame,
    levels: Vec<Option<&'static str>>,
    path: &Path,
) -> Result<()> {
    let levels: StringChunked = levels.into_iter().collect();
    let levels = levels.with_name(COL_LEVEL.into()).into_series();
    df.with_column(levels)
        .with_context(|| format!("failed to append column '{}'", COL_LEVEL))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    file.write_all(encoding::UTF8_BOM)?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("failed to write CSV: {}", path.display()))?;

    Ok(())
}

/// Decode a tabular file with encoding fallback and parse it with Polars.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let text = encoding::read_text(path)?;
    parse_csv(text).with_context(|| format!("failed to parse CSV: {}", path.display()))
}

fn parse_csv(text: String) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None) // Scan entire file
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()?;

    Ok(df)
}

/// Extract a column as strings, casting non-string columns along the way.
fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let col = df
        .column(name)
        .with_context(|| format!("column '{}' not found", name))?
        .cast(&DataType::String)
        .with_context(|| format!("column '{}' is not convertible to string", name))?;
    let ca = col.str()?;

    Ok(ca
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect())
}

/// Extract a column as floats. A non-strict cast turns unparseable cells into
/// nulls, which downstream matching treats as "no coordinates".
fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = df
        .column(name)
        .with_context(|| format!("column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("column '{}' is not convertible to float", name))?;
    let ca = col.f64()?;

    Ok(ca.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn garden_csv() -> String {
        "批次,名称,经度,纬度,描述\n\
         1,拙政园,120.629,31.325,全国重点文物保护单位\n\
         2,某园,,31.0,\n\
         3,无坐标园,不详,不详,市级文物保护单位\n"
            .to_string()
    }

    #[test]
    fn test_parse_and_extract_records() {
        let df = parse_csv(garden_csv()).unwrap();
        assert_eq!(df.height(), 3);

        let names = string_column(&df, COL_NAME).unwrap();
        assert_eq!(names[0].as_deref(), Some("拙政园"));

        let lons = float_column(&df, COL_LON).unwrap();
        assert_eq!(lons[0], Some(120.629));
        assert_eq!(lons[1], None);
        // Unparseable coordinate text becomes a null, not an error
        assert_eq!(lons[2], None);
    }

    #[test]
    fn test_missing_column_is_error() {
        let df = parse_csv("a,b\n1,2\n".to_string()).unwrap();
        assert!(string_column(&df, COL_NAME).is_err());
    }
}
