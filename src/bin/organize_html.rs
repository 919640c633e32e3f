//! HTML Batch Organizer
//!
//! Moves the scraped `<garden>.html` files into one subdirectory per
//! publication batch, using the batch column of the garden list CSV as the
//! lookup. Files without a CSV entry stay where they are and get reported.
//!
//! Usage:
//!   cargo run --bin organize_html

use std::path::Path;

use anyhow::Result;

use suzhou_garden_prep::organize;

const GARDEN_CSV: &str = "dataset/SuzhouGardenList.csv";
const HTML_DIR: &str = "html";

fn main() -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("HTML BATCH ORGANIZER");
    println!("{}", "=".repeat(80));

    if !Path::new(GARDEN_CSV).exists() {
        anyhow::bail!("input file not found: {}", GARDEN_CSV);
    }

    let index = organize::load_batch_index(Path::new(GARDEN_CSV))?;
    println!("\nLoaded {} garden entries from CSV\n", index.len());

    let stats = organize::organize_html_files(Path::new(HTML_DIR), &index)?;

    println!("\n{}", "=".repeat(80));
    println!("MOVE STATISTICS");
    println!("{}", "=".repeat(80));

    for (batch, count) in stats.batch_summary() {
        println!("  Batch {}: {} files", batch, count);
    }

    if !stats.not_found.is_empty() {
        println!("\nFiles without batch info ({}):", stats.not_found.len());
        for name in &stats.not_found {
            println!("  - {}.html", name);
        }
    }

    if stats.errors > 0 {
        println!("\nFailed moves: {}", stats.errors);
    }

    println!("\n✓ Moved {} files in total\n", stats.total_moved());
    Ok(())
}
