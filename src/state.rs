use std::path::{Path, PathBuf};

use crate::color::FilePalette;
use crate::config::AppConfig;
use crate::data::model::{Area, RawUpload};
use crate::data::pipeline::{process_batch, BatchReport};
use crate::export::export_archive;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Files queued for analysis, in the order they were added.
    pub uploads: Vec<RawUpload>,

    /// Device area as typed by the user, in µm².
    pub area_um2: f64,

    /// Whether the area is applied (enables J-V curves and the density rule).
    pub use_area: bool,

    /// Result of the last analysis run (None until the user runs one).
    pub report: Option<BatchReport>,

    /// Curve colours for the current report.
    pub palette: FilePalette,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            area_um2: config.default_area_um2.unwrap_or(100.0),
            use_area: config.default_area_um2.is_some(),
            config,
            uploads: Vec::new(),
            report: None,
            palette: FilePalette::default(),
            status_message: None,
        }
    }

    /// The validated area, or `None` when disabled or invalid.
    pub fn area(&self) -> Option<Area> {
        if !self.use_area {
            return None;
        }
        match Area::from_um2(self.area_um2) {
            Ok(area) => Some(area),
            Err(e) => {
                log::warn!("{e}; density stage disabled");
                None
            }
        }
    }

    /// Read files from disk and queue them. Unreadable files are reported, not queued.
    pub fn add_files(&mut self, paths: &[PathBuf]) {
        let mut errors = Vec::new();
        for path in paths {
            match RawUpload::from_path(path) {
                Ok(upload) => {
                    log::info!("Queued {} ({} bytes)", upload.name, upload.bytes.len());
                    self.uploads.push(upload);
                }
                Err(e) => {
                    log::error!("Failed to read file: {e:#}");
                    errors.push(format!("{e:#}"));
                }
            }
        }
        self.status_message = (!errors.is_empty()).then(|| format!("Error: {}", errors.join("; ")));
    }

    pub fn clear(&mut self) {
        self.uploads.clear();
        self.report = None;
        self.palette = FilePalette::default();
        self.status_message = None;
    }

    /// Run the pipeline over every queued file.
    pub fn analyze(&mut self) {
        if self.use_area && self.area().is_none() {
            self.status_message = Some(format!(
                "Error: device area must be positive (got {} µm²)",
                self.area_um2
            ));
            return;
        }
        let report = process_batch(&self.uploads, self.area());
        self.palette = FilePalette::new(report.results.len());
        self.status_message = match report.failure_count() {
            0 => None,
            n => Some(format!("{n} of {} files failed", report.results.len())),
        };
        self.report = Some(report);
    }

    /// Write all rendered plots of the current report to a ZIP archive.
    pub fn export(&mut self, path: &Path) {
        let Some(report) = &self.report else {
            self.status_message = Some("Nothing to export yet".to_string());
            return;
        };
        match export_archive(path, report, &self.config.render, &self.palette) {
            Ok(entries) => {
                self.status_message = Some(format!(
                    "Exported {} entries to {}",
                    entries.len(),
                    path.display()
                ));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_is_optional_and_validated() {
        let mut state = AppState::default();
        assert!(!state.use_area);
        assert!(state.area().is_none());

        state.use_area = true;
        state.area_um2 = 250.0;
        assert_eq!(state.area().unwrap().um2(), 250.0);

        state.area_um2 = 0.0;
        assert!(state.area().is_none());
    }

    #[test]
    fn configured_area_enables_density() {
        let config = AppConfig {
            default_area_um2: Some(400.0),
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        assert!(state.use_area);
        assert_eq!(state.area_um2, 400.0);
    }

    #[test]
    fn invalid_area_blocks_analysis() {
        let mut state = AppState::default();
        state.uploads.push(RawUpload::new("a.csv", "V,I\n0,1\n"));
        state.use_area = true;
        state.area_um2 = -1.0;
        state.analyze();
        assert!(state.report.is_none());
        assert!(state.status_message.unwrap().contains("positive"));
    }

    #[test]
    fn analyze_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        std::fs::write(&good, "V,I\n0,1e-7\n1,5e-5\n").unwrap();

        let mut state = AppState::default();
        state.add_files(&[good, dir.path().join("missing.csv")]);
        assert_eq!(state.uploads.len(), 1);
        assert!(state.status_message.as_deref().unwrap().starts_with("Error"));

        state.analyze();
        assert_eq!(state.report.as_ref().unwrap().results.len(), 1);
        assert!(state.status_message.is_none());

        let out = dir.path().join("out.zip");
        state.export(&out);
        assert!(out.exists());
        assert!(state.status_message.unwrap().starts_with("Exported 2 entries"));
    }
}
