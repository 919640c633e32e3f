//! HTML Table Layout Inference
//!
//! Scraped garden detail pages embed their facts in HTML tables whose layout
//! recurs across pages. This module parses each page's `content_html`, reduces
//! every `<table>` to a structural fingerprint (row/column counts, positional
//! field slots, majority-voted cell value types) and aggregates identical
//! fingerprints across the corpus so the dominant layouts surface.
//!
//! Cell *content* is deliberately not recorded; the point is the layout, not
//! the data.

use anyhow::{anyhow, Result};
use rustc_hash::FxHashMap;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use smallvec::SmallVec;

/// Number of data rows sampled per table for value-type inference.
const TYPE_SAMPLE_ROWS: usize = 3;
/// Maximum example page names kept per structure.
const MAX_EXAMPLES: usize = 3;

/// Coarse classification of a single cell's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Empty,
    Integer,
    Float,
    Date,
    Checkbox,
    Text,
    Unknown,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Empty => "empty",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Date => "date",
            ValueType::Checkbox => "checkbox",
            ValueType::Text => "text",
            ValueType::Unknown => "unknown",
        }
    }
}

/// Classify one cell's text.
///
/// Numeric checks require the whole trimmed text to match; date checks only
/// require a leading date (trailing content is allowed); the checkbox check
/// looks for tick/box glyphs anywhere.
pub fn detect_value_type(text: &str) -> ValueType {
    let text = text.trim();
    if text.is_empty() {
        return ValueType::Empty;
    }

    if text.chars().all(|c| c.is_ascii_digit()) {
        return ValueType::Integer;
    }
    if let Some((int_part, frac_part)) = text.split_once('.') {
        if !int_part.is_empty()
            && !frac_part.is_empty()
            && int_part.chars().all(|c| c.is_ascii_digit())
            && frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return ValueType::Float;
        }
    }

    if has_date_prefix(text, '-', '-', None) || has_date_prefix(text, '年', '月', Some('日')) {
        return ValueType::Date;
    }

    if text.contains('√') || text.contains('□') || text.contains('■') {
        return ValueType::Checkbox;
    }

    ValueType::Text
}

/// True when `text` starts with `DDDD<sep1>D[D]<sep2>D[D]` plus an optional
/// required trailing marker (the 日 of the Chinese date form).
fn has_date_prefix(text: &str, sep1: char, sep2: char, trailing: Option<char>) -> bool {
    let mut chars = text.chars().peekable();

    for _ in 0..4 {
        if !chars.next().is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
    }
    if chars.next() != Some(sep1) {
        return false;
    }
    if !eat_digits(&mut chars, 1, 2) {
        return false;
    }
    if chars.next() != Some(sep2) {
        return false;
    }
    if !eat_digits(&mut chars, 1, 2) {
        return false;
    }
    match trailing {
        Some(marker) => chars.next() == Some(marker),
        None => true,
    }
}

fn eat_digits(chars: &mut std::iter::Peekable<std::str::Chars>, min: usize, max: usize) -> bool {
    let mut count = 0;
    while count < max && chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
        count += 1;
    }
    count >= min
}

/// Structural fingerprint of a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStructure {
    pub row_count: usize,
    pub col_count: usize,
    /// Positional field slots from the first row: `field_1`, `field_2`, …
    pub headers: Vec<String>,
    /// Majority-voted value type per column.
    pub field_types: Vec<ValueType>,
}

/// Short identifier derived from the table dimensions. Tables that agree on
/// row count, column count and header slot count collapse to one structure.
pub fn structure_id(structure: &TableStructure) -> String {
    let key = format!(
        "{}_{}_{}",
        structure.row_count,
        structure.col_count,
        structure.headers.len()
    );

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_string()
}

/// Parses pages and reduces their tables to [`TableStructure`]s.
pub struct TableAnalyzer {
    table: Selector,
    row: Selector,
    cell: Selector,
}

impl TableAnalyzer {
    pub fn new() -> Result<Self> {
        Ok(TableAnalyzer {
            table: parse_selector("table")?,
            row: parse_selector("tr")?,
            cell: parse_selector("th, td")?,
        })
    }

    /// Fingerprint every table in an HTML fragment, in document order.
    /// A table without rows yields `None` so callers can still count it.
    pub fn analyze_html(&self, html: &str) -> Vec<Option<TableStructure>> {
        let document = Html::parse_fragment(html);
        document
            .select(&self.table)
            .map(|table| self.analyze_table(table))
            .collect()
    }

    fn analyze_table(&self, table: ElementRef) -> Option<TableStructure> {
        let rows: Vec<ElementRef> = table.select(&self.row).collect();
        if rows.is_empty() {
            return None;
        }

        let row_count = rows.len();

        // Column count is the widest row, weighting cells by colspan
        let mut col_count = 0;
        for row in &rows {
            let width: usize = row
                .select(&self.cell)
                .map(|cell| colspan(cell))
                .sum();
            col_count = col_count.max(width);
        }

        // Positional field slots from the first row's cells
        let header_cells = rows[0].select(&self.cell).count();
        let headers = (1..=header_cells).map(|i| format!("field_{}", i)).collect();

        // Value types voted over the first few data rows. Cells are indexed
        // by raw position here, colspan expansion is not applied.
        let sample_rows = &rows[1..row_count.min(1 + TYPE_SAMPLE_ROWS)];
        let mut field_types = Vec::with_capacity(col_count);
        for col_idx in 0..col_count {
            let mut votes: SmallVec<[ValueType; TYPE_SAMPLE_ROWS]> = SmallVec::new();
            for row in sample_rows {
                if let Some(cell) = row.select(&self.cell).nth(col_idx) {
                    let text: String = cell.text().collect();
                    votes.push(detect_value_type(&text));
                }
            }
            field_types.push(majority_type(&votes));
        }

        Some(TableStructure {
            row_count,
            col_count,
            headers,
            field_types,
        })
    }
}

fn parse_selector(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|e| anyhow!("invalid selector '{}': {:?}", source, e))
}

fn colspan(cell: ElementRef) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
}

/// Pick the most voted type; ties go to the type seen first. No votes at all
/// (column beyond every sampled row) yields `Unknown`.
fn majority_type(votes: &[ValueType]) -> ValueType {
    let mut counts: SmallVec<[(ValueType, usize); 4]> = SmallVec::new();
    for vote in votes {
        match counts.iter_mut().find(|(t, _)| t == vote) {
            Some((_, n)) => *n += 1,
            None => counts.push((*vote, 1)),
        }
    }

    let mut best = ValueType::Unknown;
    let mut best_count = 0;
    for (value_type, count) in counts {
        if count > best_count {
            best = value_type;
            best_count = count;
        }
    }
    best
}

/// One scraped detail page as stored in the crawl dump.
#[derive(Debug, Deserialize)]
pub struct DetailPage {
    pub name: String,
    #[serde(default)]
    pub content_html: Option<String>,
}

/// Running aggregation of structures across the corpus.
#[derive(Debug, Default)]
pub struct StructureAccumulator {
    stats: FxHashMap<String, StructureStats>,
    order: Vec<String>,
    total_tables: usize,
}

#[derive(Debug)]
pub struct StructureStats {
    pub count: usize,
    pub structure: TableStructure,
    pub examples: Vec<String>,
    pub html_files: Vec<String>,
}

impl StructureAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_tables(&self) -> usize {
        self.total_tables
    }

    pub fn unique_structures(&self) -> usize {
        self.stats.len()
    }

    /// Record one table occurrence on the named page. Rowless tables
    /// (`None`) count towards the total but have no structure to track.
    pub fn add(&mut self, page_name: &str, structure: Option<TableStructure>) {
        self.total_tables += 1;
        let Some(structure) = structure else {
            return;
        };

        let id = structure_id(&structure);
        let html_file = format!("{}.html", page_name);

        let stats = self.stats.entry(id.clone()).or_insert_with(|| {
            self.order.push(id);
            StructureStats {
                count: 0,
                structure,
                examples: Vec::new(),
                html_files: Vec::new(),
            }
        });

        stats.count += 1;
        if stats.examples.len() < MAX_EXAMPLES {
            stats.examples.push(page_name.to_string());
        }
        if !stats.html_files.contains(&html_file) {
            stats.html_files.push(html_file);
        }
    }

    /// Finalize into a report, structures sorted by descending frequency.
    pub fn into_report(self, analysis_date: String) -> Report {
        let total_tables = self.total_tables;
        let unique_structures = self.stats.len();

        let mut stats = self.stats;
        let mut structures: Vec<StructureInfo> = self
            .order
            .into_iter()
            .filter_map(|id| stats.remove(&id).map(|s| (id, s)))
            .map(|(structure_id, stats)| {
                // One field entry per first-row slot; columns beyond the
                // first row's cells stay out of the report
                let fields = (0..stats.structure.headers.len())
                    .map(|i| FieldInfo {
                        position: i + 1,
                        field_type: stats
                            .structure
                            .field_types
                            .get(i)
                            .copied()
                            .unwrap_or(ValueType::Unknown)
                            .as_str()
                            .to_string(),
                    })
                    .collect();

                let percentage = if total_tables > 0 {
                    (stats.count as f64 / total_tables as f64 * 100.0 * 100.0).round() / 100.0
                } else {
                    0.0
                };

                StructureInfo {
                    structure_id,
                    count: stats.count,
                    percentage,
                    dimensions: Dimensions {
                        rows: stats.structure.row_count,
                        columns: stats.structure.col_count,
                    },
                    fields,
                    examples: stats.examples,
                    html_files: stats.html_files,
                }
            })
            .collect();

        structures.sort_by(|a, b| b.count.cmp(&a.count));

        Report {
            summary: Summary {
                total_tables,
                unique_structures,
                analysis_date,
            },
            structures,
        }
    }
}

/// Serialized analysis report.
#[derive(Debug, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub structures: Vec<StructureInfo>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_tables: usize,
    pub unique_structures: usize,
    pub analysis_date: String,
}

#[derive(Debug, Serialize)]
pub struct StructureInfo {
    pub structure_id: String,
    pub count: usize,
    pub percentage: f64,
    pub dimensions: Dimensions,
    pub fields: Vec<FieldInfo>,
    pub examples: Vec<String>,
    pub html_files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Dimensions {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Serialize)]
pub struct FieldInfo {
    pub position: usize,
    #[serde(rename = "type")]
    pub field_type: String,
}
