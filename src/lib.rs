//! Suzhou Garden Dataset Preparation
//!
//! Offline batch tools for preparing the Suzhou garden dataset:
//! - `heritage` / `geo` / `dataset`: enrich the garden list with
//!   heritage-protection levels (name, proximity, and keyword matching)
//! - `tables`: infer recurring HTML table layouts from scraped detail pages
//! - `organize`: sort scraped HTML files into publication-batch folders
//! - `images`: normalize image folders to canonical `NN.jpg` naming
//!
//! Each tool is a linear batch job with its own binary under `src/bin/`;
//! the modules here hold the shared, testable logic.

pub mod dataset;
pub mod encoding;
pub mod geo;
pub mod heritage;
pub mod images;
pub mod organize;
pub mod tables;

// Re-export commonly used types
pub use dataset::{GardenRecord, GardenTable, HeritageSite};
pub use geo::haversine_km;
pub use heritage::{resolve, MatchMethod, MatchResult, Resolution};
