//! Table Structure Analysis
//!
//! Reads the crawl dump of garden detail pages, fingerprints every HTML
//! table in each page's `content_html`, and writes a JSON report of the
//! recurring table layouts sorted by frequency.
//!
//! Usage:
//!   cargo run --bin analyze_table_structure

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use suzhou_garden_prep::tables::{DetailPage, StructureAccumulator, TableAnalyzer};

const INPUT_JSON: &str = "archived/ylml_details.json";
const OUTPUT_JSON: &str = "table_structure_analysis.json";

fn main() -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("TABLE STRUCTURE ANALYSIS");
    println!("{}", "=".repeat(80));

    if !Path::new(INPUT_JSON).exists() {
        anyhow::bail!("input file not found: {}", INPUT_JSON);
    }

    println!("\nReading: {}", INPUT_JSON);
    let text = fs::read_to_string(INPUT_JSON)
        .with_context(|| format!("failed to read {}", INPUT_JSON))?;
    let pages: Vec<DetailPage> =
        serde_json::from_str(&text).context("failed to parse detail-page JSON")?;
    println!("  Pages: {}", pages.len());

    let analyzer = TableAnalyzer::new()?;
    let mut accumulator = StructureAccumulator::new();

    for (idx, page) in pages.iter().enumerate() {
        if (idx + 1) % 10 == 0 {
            println!("  processed {}/{} pages", idx + 1, pages.len());
        }

        let Some(html) = page.content_html.as_deref().filter(|h| !h.is_empty()) else {
            continue;
        };

        for structure in analyzer.analyze_html(html) {
            accumulator.add(&page.name, structure);
        }
    }

    println!("\nFound {} tables, {} unique structures",
        accumulator.total_tables(),
        accumulator.unique_structures()
    );

    let analysis_date = Local::now().format("%Y-%m-%d").to_string();
    let report = accumulator.into_report(analysis_date);

    fs::write(OUTPUT_JSON, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("failed to write {}", OUTPUT_JSON))?;
    println!("✓ Report saved to: {}", OUTPUT_JSON);

    println!("\nStructure breakdown:");
    for info in &report.structures {
        println!(
            "  {}: {} tables ({} rows × {} columns, {:.2}%)",
            info.structure_id,
            info.count,
            info.dimensions.rows,
            info.dimensions.columns,
            info.percentage
        );
    }
    println!();

    Ok(())
}
