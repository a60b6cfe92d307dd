use std::io::{Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::color::FilePalette;
use crate::config::RenderConfig;
use crate::data::model::{Layout, PickSource};
use crate::data::pipeline::{BatchReport, ProcessingResult};
use crate::render::raster::render_png;

pub const SUMMARY_ENTRY: &str = "summary.json";

// ---------------------------------------------------------------------------
// summary.json schema
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Summary<'a> {
    area_um2: Option<f64>,
    files: Vec<SummaryEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SummaryEntry<'a> {
    Success {
        file: &'a str,
        layout: Layout,
        voltage_column: &'a str,
        voltage_source: PickSource,
        current_column: &'a str,
        current_source: PickSource,
        points: usize,
        observations: Vec<String>,
        plots: Vec<String>,
    },
    Failure {
        file: &'a str,
        error: &'a str,
    },
}

// ---------------------------------------------------------------------------
// Archive writer
// ---------------------------------------------------------------------------

/// Archive entry name for one plot, e.g. `diode.csv_iv.png`.
pub fn plot_entry_name(file_name: &str, label: &str) -> String {
    format!("{file_name}_{label}.png")
}

/// Render every curve of every successful file into a ZIP, plus `summary.json`.
///
/// Returns the entry names written, in order.
pub fn write_archive<W: Write + Seek>(
    writer: W,
    report: &BatchReport,
    render: &RenderConfig,
    palette: &FilePalette,
) -> Result<Vec<String>> {
    let mut zip = ZipWriter::new(writer);
    // PNG is already compressed.
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut written = Vec::new();
    let mut files = Vec::with_capacity(report.results.len());

    for (index, result) in report.results.iter().enumerate() {
        match result {
            ProcessingResult::Success(analysis) => {
                let mut plots = Vec::new();
                for curve in analysis.curves.iter() {
                    let name = plot_entry_name(&analysis.name, curve.kind.label());
                    let png = render_png(curve, render, palette.rgb_for(index))?;
                    zip.start_file(name.as_str(), options)
                        .with_context(|| format!("starting ZIP entry {name}"))?;
                    zip.write_all(&png)
                        .with_context(|| format!("writing ZIP entry {name}"))?;
                    plots.push(name.clone());
                    written.push(name);
                }

                let sel = &analysis.selection;
                files.push(SummaryEntry::Success {
                    file: &analysis.name,
                    layout: analysis.table.report.layout,
                    voltage_column: &sel.voltage.name,
                    voltage_source: sel.voltage.source,
                    current_column: &sel.current.name,
                    current_source: sel.current.source,
                    points: analysis.sweep.len(),
                    observations: analysis.observations.iter().map(ToString::to_string).collect(),
                    plots,
                });
            }
            ProcessingResult::Failure { name, message } => {
                files.push(SummaryEntry::Failure {
                    file: name,
                    error: message,
                });
            }
        }
    }

    let summary = Summary {
        area_um2: report.area.map(|a| a.um2()),
        files,
    };
    let summary_json = serde_json::to_string_pretty(&summary).context("serializing summary")?;
    zip.start_file(SUMMARY_ENTRY, options)
        .context("starting ZIP entry for summary")?;
    zip.write_all(summary_json.as_bytes())
        .context("writing summary")?;
    written.push(SUMMARY_ENTRY.to_string());

    zip.finish().context("finalizing ZIP archive")?;
    Ok(written)
}

/// Write the archive to `path`.
pub fn export_archive(
    path: &Path,
    report: &BatchReport,
    render: &RenderConfig,
    palette: &FilePalette,
) -> Result<Vec<String>> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let entries = write_archive(file, report, render, palette)?;
    log::info!("Exported {} entries to {}", entries.len(), path.display());
    Ok(entries)
}
