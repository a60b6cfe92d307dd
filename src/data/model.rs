use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// RawUpload – one file as handed to the pipeline
// ---------------------------------------------------------------------------

/// A named blob of bytes, exactly as uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawUpload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk; the upload is named after the file name component.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

// ---------------------------------------------------------------------------
// ParsedTable – rectangular numeric table
// ---------------------------------------------------------------------------

/// How the first line of the file was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Layout {
    Tab,
    Comma,
    Whitespace,
}

impl Layout {
    /// Byte delimiter for the `csv` reader, `None` for whitespace layout.
    pub fn delimiter(self) -> Option<u8> {
        match self {
            Layout::Tab => Some(b'\t'),
            Layout::Comma => Some(b','),
            Layout::Whitespace => None,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Tab => write!(f, "tab-delimited"),
            Layout::Comma => write!(f, "comma-delimited"),
            Layout::Whitespace => write!(f, "whitespace-delimited"),
        }
    }
}

/// What the parser had to paper over while building the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
    pub layout: Layout,
    /// Non-empty cells that failed numeric coercion.
    pub coerced_cells: usize,
    /// Rows dropped because every cell was missing.
    pub dropped_rows: usize,
    /// Cells added to short rows.
    pub padded_cells: usize,
}

impl ParseReport {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            coerced_cells: 0,
            dropped_rows: 0,
            padded_cells: 0,
        }
    }

    /// `true` when nothing had to be coerced, dropped or padded.
    pub fn is_clean(&self) -> bool {
        self.coerced_cells == 0 && self.dropped_rows == 0 && self.padded_cells == 0
    }
}

/// A single named column; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Columns of equal length, aligned by row position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub columns: Vec<Column>,
    pub report: ParseReport,
}

impl ParsedTable {
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Voltage,
    Current,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Voltage => write!(f, "Voltage"),
            ColumnRole::Current => write!(f, "Current"),
        }
    }
}

/// Whether a role was bound by header name or by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PickSource {
    ByName,
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPick {
    pub role: ColumnRole,
    pub index: usize,
    pub name: String,
    pub source: PickSource,
}

/// `Voltage: "V (V)"`, with a `(by position)` suffix for fallback picks.
impl fmt::Display for ColumnPick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: \"{}\"", self.role, self.name)?;
        if self.source == PickSource::Positional {
            write!(f, " (by position)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub voltage: ColumnPick,
    pub current: ColumnPick,
}

impl ColumnSelection {
    /// Both roles landed on the same column (possible with positional fallback).
    pub fn is_degenerate(&self) -> bool {
        self.voltage.index == self.current.index
    }

    /// Either role fell back to position.
    pub fn used_fallback(&self) -> bool {
        self.voltage.source == PickSource::Positional
            || self.current.source == PickSource::Positional
    }
}

// ---------------------------------------------------------------------------
// Area – device area, validated once per batch
// ---------------------------------------------------------------------------

/// µm² → cm².
pub const UM2_TO_CM2: f64 = 1e-8;

/// Strictly positive device area, entered in µm².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    um2: f64,
}

impl Area {
    pub fn from_um2(um2: f64) -> Result<Self, PipelineError> {
        if um2.is_finite() && um2 > 0.0 {
            Ok(Self { um2 })
        } else {
            Err(PipelineError::InvalidArea(um2))
        }
    }

    pub fn um2(&self) -> f64 {
        self.um2
    }

    pub fn cm2(&self) -> f64 {
        self.um2 * UM2_TO_CM2
    }
}

// ---------------------------------------------------------------------------
// Derived series and the cleaned sweep
// ---------------------------------------------------------------------------

/// Current density (native current unit / cm²), row-aligned with the table.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub values: Vec<Option<f64>>,
}

/// Rows where both voltage and current are present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sweep {
    pub voltage: Vec<f64>,
    pub current: Vec<f64>,
    /// Same length as `current` when an area was supplied.
    pub density: Option<Vec<f64>>,
}

impl Sweep {
    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_of_one_um2_is_exactly_1e_minus_8_cm2() {
        let area = Area::from_um2(1.0).unwrap();
        assert_eq!(area.cm2(), 1e-8);
    }

    #[test]
    fn area_rejects_non_positive_and_non_finite() {
        assert_eq!(Area::from_um2(0.0), Err(PipelineError::InvalidArea(0.0)));
        assert!(Area::from_um2(-5.0).is_err());
        assert!(Area::from_um2(f64::NAN).is_err());
        assert!(Area::from_um2(f64::INFINITY).is_err());
    }

    #[test]
    fn column_pick_describes_role_and_source() {
        let mut pick = ColumnPick {
            role: ColumnRole::Current,
            index: 1,
            name: "I (A)".into(),
            source: PickSource::ByName,
        };
        assert_eq!(pick.to_string(), "Current: \"I (A)\"");

        pick.role = ColumnRole::Voltage;
        pick.source = PickSource::Positional;
        assert_eq!(pick.to_string(), "Voltage: \"I (A)\" (by position)");
    }

    #[test]
    fn raw_upload_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diode_a.csv");
        std::fs::write(&path, b"V,I\n0,1\n").unwrap();

        let upload = RawUpload::from_path(&path).unwrap();
        assert_eq!(upload.name, "diode_a.csv");
        assert_eq!(upload.bytes, b"V,I\n0,1\n");
    }

    #[test]
    fn raw_upload_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RawUpload::from_path(&dir.path().join("nope.txt")).is_err());
    }
}
