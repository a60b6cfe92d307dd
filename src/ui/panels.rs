use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::ParsedTable;
use crate::data::pipeline::{FileAnalysis, ProcessingResult};
use crate::state::AppState;
use crate::ui::plot;

const PREVIEW_ROWS: usize = 200;

// ---------------------------------------------------------------------------
// Left side panel – area input and file queue
// ---------------------------------------------------------------------------

/// Render the left input panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Device area");
    ui.separator();

    ui.checkbox(&mut state.use_area, "Apply area (enables J-V)");
    ui.add_enabled(
        state.use_area,
        egui::DragValue::new(&mut state.area_um2)
            .range(0.0001..=f64::MAX)
            .speed(1.0)
            .max_decimals(4)
            .suffix(" µm²"),
    );
    if let Some(area) = state.area() {
        ui.weak(format!("= {:.4e} cm²", area.cm2()));
    }

    ui.add_space(8.0);
    ui.heading("Files");
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Add…").clicked() {
            open_files_dialog(state);
        }
        if ui
            .add_enabled(!state.uploads.is_empty(), egui::Button::new("Clear"))
            .clicked()
        {
            state.clear();
        }
    });

    if state.uploads.is_empty() {
        ui.label("No files queued.");
    } else {
        ScrollArea::vertical()
            .max_height(240.0)
            .auto_shrink([false, true])
            .show(ui, |ui: &mut Ui| {
                for upload in &state.uploads {
                    ui.label(format!("{}  ({} B)", upload.name, upload.bytes.len()));
                }
            });
    }

    ui.add_space(8.0);
    if ui
        .add_enabled(
            !state.uploads.is_empty(),
            egui::Button::new(RichText::new("Analyze").strong()),
        )
        .clicked()
    {
        state.analyze();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open files…").clicked() {
                open_files_dialog(state);
                ui.close_menu();
            }
            let can_export = state
                .report
                .as_ref()
                .is_some_and(|r| r.successes().next().is_some());
            if ui
                .add_enabled(can_export, egui::Button::new("Export plots…"))
                .clicked()
            {
                save_archive_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(report) = &state.report {
            ui.label(format!(
                "{} files analysed, {} failed",
                report.results.len(),
                report.failure_count()
            ));
        } else {
            ui.label(format!("{} files queued", state.uploads.len()));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – per-file results
// ---------------------------------------------------------------------------

/// Render one section per processed file, in upload order.
pub fn results_panel(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Add sweep files and press Analyze  (File → Open files…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (index, result) in report.results.iter().enumerate() {
                match result {
                    ProcessingResult::Success(analysis) => {
                        file_section(ui, index, analysis, state.palette.color_for(index));
                    }
                    ProcessingResult::Failure { name, message } => {
                        ui.colored_label(
                            Color32::RED,
                            format!("Failed to process {name}: {message}"),
                        );
                    }
                }
                ui.separator();
            }
        });
}

fn file_section(ui: &mut Ui, index: usize, analysis: &FileAnalysis, color: Color32) {
    ui.heading(RichText::new(&analysis.name).color(color));

    let sel = &analysis.selection;
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label(format!("{} layout", analysis.table.report.layout));
        ui.separator();
        ui.label(sel.voltage.to_string());
        ui.label(sel.current.to_string());
        ui.separator();
        ui.label(format!("{} points", analysis.sweep.len()));
    });

    let report = &analysis.table.report;
    if !report.is_clean() || analysis.dropped_bytes > 0 {
        ui.colored_label(
            Color32::from_rgb(200, 140, 0),
            format!(
                "{} non-numeric cells, {} empty rows dropped, {} padded cells, {} undecodable bytes",
                report.coerced_cells, report.dropped_rows, report.padded_cells, analysis.dropped_bytes
            ),
        );
    }
    if sel.used_fallback() {
        ui.colored_label(
            Color32::from_rgb(200, 140, 0),
            "Some columns were picked by position (no header starting with V or I)",
        );
    }
    if sel.is_degenerate() {
        ui.colored_label(
            Color32::from_rgb(200, 140, 0),
            "Voltage and current resolved to the same column",
        );
    }

    plot::curve_pair(ui, &format!("file_{index}"), &analysis.curves, color);

    ui.strong("Observations");
    if analysis.observations.is_empty() {
        ui.label("- No significant insights detected.");
    }
    for obs in &analysis.observations {
        ui.label(format!("- {obs}"));
    }

    egui::CollapsingHeader::new("Parsed data")
        .id_salt(format!("table_{index}"))
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            table_preview(ui, &analysis.table);
        });
}

fn table_preview(ui: &mut Ui, table: &ParsedTable) {
    let n_rows = table.n_rows().min(PREVIEW_ROWS);
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(220.0)
        .columns(TableColumn::auto().at_least(80.0), table.n_columns())
        .header(20.0, |mut header| {
            for column in &table.columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(&column.name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, n_rows, |mut row| {
                let r = row.index();
                for column in &table.columns {
                    row.col(|ui: &mut Ui| match column.values[r] {
                        Some(v) => {
                            ui.label(format!("{v:.6e}"));
                        }
                        None => {
                            ui.weak("—");
                        }
                    });
                }
            });
        });
    if table.n_rows() > PREVIEW_ROWS {
        ui.weak(format!("… {} more rows", table.n_rows() - PREVIEW_ROWS));
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open I-V sweep files")
        .add_filter("Sweep data", &["csv", "txt"])
        .add_filter("CSV", &["csv"])
        .add_filter("Text", &["txt"])
        .pick_files();

    if let Some(paths) = files {
        state.add_files(&paths);
    }
}

pub fn save_archive_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export plots")
        .set_file_name(&state.config.archive_name)
        .add_filter("ZIP archive", &["zip"])
        .save_file();

    if let Some(path) = file {
        state.export(&path);
    }
}
