//! Image Normalization
//!
//! Normalizes the per-garden image folders into the canonical convention:
//! files renamed to `01.jpg`, `02.jpg`, … in sorted order, PNGs flattened
//! onto a white background and re-encoded as JPEG, everything lowercase
//! `.jpg`. Supports a dry-run preview, optional pre-run backup, and writes a
//! plain-text report of every operation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use image::{Rgb, RgbImage};

/// Knobs for one normalization run.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Plan and report only, touch nothing.
    pub dry_run: bool,
    /// Copy each folder into the backup tree before processing it.
    pub backup: bool,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

/// What happened (or would happen) to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ConvertAndRename,
    Rename,
    Keep,
    ConvertFailed,
    Error,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ConvertAndRename => "convert_and_rename",
            Action::Rename => "rename",
            Action::Keep => "keep",
            Action::ConvertFailed => "convert_failed",
            Action::Error => "error",
        }
    }
}

/// One planned or executed file operation.
#[derive(Debug, Clone)]
pub struct Operation {
    pub old_name: String,
    pub new_name: String,
    pub action: Action,
    pub error: Option<String>,
}

/// Per-folder outcome.
#[derive(Debug)]
pub struct FolderReport {
    pub folder_name: String,
    pub images_found: usize,
    pub images_processed: usize,
    pub operations: Vec<Operation>,
}

/// Run-wide counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Totals {
    pub total_folders: usize,
    pub total_images: usize,
    pub renamed: usize,
    pub converted: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Plan the rename/convert sequence for a folder's image files.
///
/// `files` must already be the sorted image file names. The Nth file becomes
/// `NN.jpg`; PNGs additionally need conversion. Pure, so the dry run and the
/// real run share one plan.
pub fn plan_operations(files: &[String]) -> Vec<(String, String, Action)> {
    files
        .iter()
        .enumerate()
        .map(|(index, old_name)| {
            let new_name = format!("{:02}.jpg", index + 1);
            let is_png = Path::new(old_name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));

            let action = if is_png {
                Action::ConvertAndRename
            } else if *old_name != new_name {
                Action::Rename
            } else {
                Action::Keep
            };

            (old_name.clone(), new_name, action)
        })
        .collect()
}

/// Decode a PNG, flatten any alpha onto white, encode as JPEG.
pub fn convert_png_to_jpg(png_path: &Path, jpg_path: &Path, quality: u8) -> Result<()> {
    let img = image::open(png_path)
        .with_context(|| format!("failed to decode {}", png_path.display()))?;
    let rgba = img.to_rgba8();

    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let a = a as u16;
        let blend = |c: u8| ((c as u16 * a + 255 * (255 - a)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    let mut out = fs::File::create(jpg_path)
        .with_context(|| format!("failed to create {}", jpg_path.display()))?;
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .encode_image(&rgb)
        .with_context(|| format!("failed to encode {}", jpg_path.display()))?;

    Ok(())
}

/// Drives a whole normalization run over the garden image folders.
pub struct Normalizer {
    base_dir: PathBuf,
    opts: NormalizeOptions,
    pub totals: Totals,
    log_lines: Vec<String>,
}

impl Normalizer {
    pub fn new(base_dir: PathBuf, opts: NormalizeOptions) -> Self {
        Normalizer {
            base_dir,
            opts,
            totals: Totals::default(),
            log_lines: Vec::new(),
        }
    }

    fn log(&mut self, level: &str, message: String) {
        let line = format!("[{}] {}: {}", Local::now().format("%H:%M:%S"), level, message);
        println!("{}", line);
        self.log_lines.push(line);
    }

    /// Process every garden folder under the base directory, in sorted order.
    pub fn run(&mut self) -> Result<Vec<FolderReport>> {
        if !self.base_dir.exists() {
            anyhow::bail!("image directory not found: {}", self.base_dir.display());
        }

        self.log("INFO", "=".repeat(80));
        self.log("INFO", "Suzhou garden image normalization".to_string());
        self.log("INFO", format!("directory: {}", self.base_dir.display()));
        self.log(
            "INFO",
            format!(
                "mode: {}",
                if self.opts.dry_run { "dry run (no files modified)" } else { "live" }
            ),
        );
        self.log("INFO", format!("backup: {}", if self.opts.backup { "yes" } else { "no" }));
        self.log("INFO", format!("jpeg quality: {}", self.opts.quality));
        self.log("INFO", "=".repeat(80));

        let mut folders: Vec<PathBuf> = fs::read_dir(&self.base_dir)
            .with_context(|| format!("failed to read {}", self.base_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        folders.sort();

        self.totals.total_folders = folders.len();
        self.log("INFO", format!("found {} garden folders", folders.len()));

        let mut reports = Vec::with_capacity(folders.len());
        for (i, folder) in folders.iter().enumerate() {
            let name = folder
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("?")
                .to_string();
            self.log("INFO", format!("[{}/{}] processing: {}", i + 1, folders.len(), name));

            let report = self.normalize_folder(folder, name);
            self.totals.total_images += report.images_found;
            if report.images_processed > 0 {
                self.log(
                    "SUCCESS",
                    format!(
                        "  processed {}/{} images",
                        report.images_processed, report.images_found
                    ),
                );
            }
            reports.push(report);
        }

        Ok(reports)
    }

    fn normalize_folder(&mut self, folder: &Path, folder_name: String) -> FolderReport {
        let mut report = FolderReport {
            folder_name,
            images_found: 0,
            images_processed: 0,
            operations: Vec::new(),
        };

        let files = match image_files(folder) {
            Ok(files) => files,
            Err(e) => {
                self.log("ERROR", format!("failed to list {}: {}", folder.display(), e));
                self.totals.errors += 1;
                return report;
            }
        };
        report.images_found = files.len();

        if files.is_empty() {
            self.log("WARNING", format!("  skipped (no images): {}", report.folder_name));
            self.totals.skipped += 1;
            return report;
        }

        if self.opts.backup && !self.opts.dry_run && !self.backup_folder(folder) {
            self.totals.errors += 1;
            return report;
        }

        for (old_name, new_name, action) in plan_operations(&files) {
            let mut op = Operation {
                old_name: old_name.clone(),
                new_name: new_name.clone(),
                action,
                error: None,
            };

            if self.opts.dry_run {
                report.images_processed += 1;
            } else {
                match self.execute(folder, &old_name, &new_name, action) {
                    Ok(executed) => {
                        op.action = executed;
                        if executed == Action::ConvertFailed {
                            self.totals.errors += 1;
                        } else {
                            report.images_processed += 1;
                        }
                    }
                    Err(e) => {
                        op.action = Action::Error;
                        op.error = Some(e.to_string());
                        self.log(
                            "ERROR",
                            format!("  failed: {}/{} - {}", folder.display(), old_name, e),
                        );
                        self.totals.errors += 1;
                    }
                }
            }

            report.operations.push(op);
        }

        report
    }

    /// Apply one planned action to disk. Returns the action that actually
    /// happened (conversion can downgrade to `ConvertFailed`).
    fn execute(
        &mut self,
        folder: &Path,
        old_name: &str,
        new_name: &str,
        action: Action,
    ) -> Result<Action> {
        let old_path = folder.join(old_name);
        let new_path = folder.join(new_name);

        match action {
            Action::ConvertAndRename => {
                if let Err(e) = convert_png_to_jpg(&old_path, &new_path, self.opts.quality) {
                    self.log("ERROR", format!("  conversion failed: {} - {}", old_name, e));
                    return Ok(Action::ConvertFailed);
                }
                fs::remove_file(&old_path)
                    .with_context(|| format!("failed to remove {}", old_path.display()))?;
                self.totals.converted += 1;
                self.totals.renamed += 1;
                Ok(Action::ConvertAndRename)
            }
            Action::Rename => {
                // Go through a temp name when the target slot is taken by
                // another file of the same batch
                if new_path.exists() && new_path != old_path {
                    let temp_path = folder.join(format!("temp_{}", new_name));
                    fs::rename(&old_path, &temp_path)
                        .with_context(|| format!("failed to rename {}", old_path.display()))?;
                    fs::rename(&temp_path, &new_path)
                        .with_context(|| format!("failed to rename {}", temp_path.display()))?;
                } else {
                    fs::rename(&old_path, &new_path)
                        .with_context(|| format!("failed to rename {}", old_path.display()))?;
                }
                self.totals.renamed += 1;
                Ok(Action::Rename)
            }
            Action::Keep => Ok(Action::Keep),
            Action::ConvertFailed | Action::Error => Ok(action),
        }
    }

    fn backup_folder(&mut self, folder: &Path) -> bool {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let backup_root = self
            .base_dir
            .parent()
            .unwrap_or(Path::new("."))
            .join("backup")
            .join("images_backup")
            .join(stamp);
        let target = backup_root.join(folder.file_name().unwrap_or_default());

        match copy_dir_recursive(folder, &target) {
            Ok(()) => {
                self.log(
                    "DEBUG",
                    format!("backed up: {} -> {}", folder.display(), target.display()),
                );
                true
            }
            Err(e) => {
                self.log("ERROR", format!("backup failed: {} - {}", folder.display(), e));
                false
            }
        }
    }

    /// Print the end-of-run summary.
    pub fn print_summary(&mut self) {
        self.log("INFO", "=".repeat(80));
        self.log("INFO", "summary".to_string());
        self.log("INFO", "=".repeat(80));
        self.log("INFO", format!("folders processed: {}", self.totals.total_folders));
        self.log("INFO", format!("images found: {}", self.totals.total_images));
        self.log("SUCCESS", format!("renamed: {}", self.totals.renamed));
        self.log("SUCCESS", format!("converted (PNG -> JPG): {}", self.totals.converted));
        self.log("WARNING", format!("folders skipped: {}", self.totals.skipped));
        let level = if self.totals.errors > 0 { "ERROR" } else { "INFO" };
        self.log(level, format!("errors: {}", self.totals.errors));

        if self.opts.dry_run {
            self.log("WARNING", "dry run: no files were modified".to_string());
            self.log("WARNING", "drop --dry-run to apply the operations".to_string());
        }
    }

    /// Write the detailed plain-text report.
    pub fn write_report(&self, reports: &[FolderReport], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut file = fs::File::create(path)
            .with_context(|| format!("failed to create report: {}", path.display()))?;

        writeln!(file, "Suzhou garden image normalization report")?;
        writeln!(file, "{}\n", "=".repeat(80))?;
        writeln!(file, "time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "directory: {}", self.base_dir.display())?;
        writeln!(
            file,
            "mode: {}\n",
            if self.opts.dry_run { "dry run" } else { "live" }
        )?;

        writeln!(file, "totals:")?;
        writeln!(file, "{}", "-".repeat(80))?;
        writeln!(file, "total_folders: {}", self.totals.total_folders)?;
        writeln!(file, "total_images: {}", self.totals.total_images)?;
        writeln!(file, "renamed: {}", self.totals.renamed)?;
        writeln!(file, "converted: {}", self.totals.converted)?;
        writeln!(file, "skipped: {}", self.totals.skipped)?;
        writeln!(file, "errors: {}\n", self.totals.errors)?;

        writeln!(file, "operations:")?;
        writeln!(file, "{}\n", "-".repeat(80))?;
        for report in reports {
            writeln!(file, "folder: {}", report.folder_name)?;
            writeln!(file, "  images found: {}", report.images_found)?;
            writeln!(file, "  images processed: {}", report.images_processed)?;
            for op in &report.operations {
                if op.action == Action::Keep {
                    continue;
                }
                writeln!(
                    file,
                    "    {} -> {} [{}]",
                    op.old_name,
                    op.new_name,
                    op.action.as_str()
                )?;
            }
            writeln!(file)?;
        }

        writeln!(file, "log:")?;
        writeln!(file, "{}", "-".repeat(80))?;
        for line in &self.log_lines {
            writeln!(file, "{}", line)?;
        }

        Ok(())
    }
}

/// Image files directly in a folder, sorted by lowercased name.
fn image_files(folder: &Path) -> Result<Vec<String>> {
    let mut files: Vec<String> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| {
            Path::new(name).extension().is_some_and(|ext| {
                ext.eq_ignore_ascii_case("jpg")
                    || ext.eq_ignore_ascii_case("jpeg")
                    || ext.eq_ignore_ascii_case("png")
            })
        })
        .collect();

    files.sort_by_key(|name| name.to_lowercase());
    Ok(files)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_renumbers_in_order() {
        let plan = plan_operations(&names(&["a.jpg", "b.jpeg", "c.jpg"]));
        assert_eq!(plan[0], ("a.jpg".into(), "01.jpg".into(), Action::Rename));
        assert_eq!(plan[1], ("b.jpeg".into(), "02.jpg".into(), Action::Rename));
        assert_eq!(plan[2], ("c.jpg".into(), "03.jpg".into(), Action::Rename));
    }

    #[test]
    fn test_plan_keeps_already_canonical_names() {
        let plan = plan_operations(&names(&["01.jpg", "02.jpg"]));
        assert_eq!(plan[0].2, Action::Keep);
        assert_eq!(plan[1].2, Action::Keep);
    }

    #[test]
    fn test_plan_converts_png_even_when_position_matches() {
        let plan = plan_operations(&names(&["01.png", "photo.PNG"]));
        assert_eq!(plan[0].2, Action::ConvertAndRename);
        assert_eq!(plan[0].1, "01.jpg");
        assert_eq!(plan[1].2, Action::ConvertAndRename);
        assert_eq!(plan[1].1, "02.jpg");
    }

    #[test]
    fn test_plan_two_digit_padding() {
        let files: Vec<String> = (0..12).map(|i| format!("img{}.jpg", i)).collect();
        let plan = plan_operations(&files);
        assert_eq!(plan[8].1, "09.jpg");
        assert_eq!(plan[9].1, "10.jpg");
        assert_eq!(plan[11].1, "12.jpg");
    }

    #[test]
    fn test_convert_png_flattens_alpha_onto_white() {
        let dir = std::env::temp_dir().join("garden_png_convert_test");
        fs::create_dir_all(&dir).unwrap();
        let png = dir.join("in.png");
        let jpg = dir.join("out.jpg");

        // Top pixel fully transparent, bottom pixel half-transparent black
        let mut img = image::RgbaImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 0, 128]));
        img.save(&png).unwrap();

        convert_png_to_jpg(&png, &jpg, 90).unwrap();

        let out = image::open(&jpg).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (1, 2));
        // Transparent becomes white, half-transparent black mid-grey
        // (with some slack for the lossy encode)
        for c in out.get_pixel(0, 0).0 {
            assert!(c > 235, "expected near-white, got {}", c);
        }
        for c in out.get_pixel(0, 1).0 {
            assert!((100..=155).contains(&c), "expected mid-grey, got {}", c);
        }

        fs::remove_dir_all(&dir).ok();
    }
}
