use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::render::{Curve, CurveSet};

// ---------------------------------------------------------------------------
// I-V / J-V plots (central panel)
// ---------------------------------------------------------------------------

const PLOT_HEIGHT: f32 = 260.0;

/// Draw the I-V curve and, when present, the J-V curve side by side.
pub fn curve_pair(ui: &mut Ui, id: &str, curves: &CurveSet, color: Color32) {
    match &curves.jv {
        Some(jv) => {
            ui.columns(2, |cols| {
                curve_plot(&mut cols[0], id, &curves.iv, color);
                curve_plot(&mut cols[1], id, jv, color);
            });
        }
        None => {
            curve_plot(ui, id, &curves.iv, color);
            ui.weak("Set a device area to plot the J-V curve.");
        }
    }
}

fn curve_plot(ui: &mut Ui, id: &str, curve: &Curve, color: Color32) {
    ui.label(RichText::new(&curve.title).strong());

    let points: PlotPoints = curve.points.iter().copied().collect();
    Plot::new(format!("{id}_{}", curve.kind.label()))
        .legend(Legend::default())
        .x_axis_label(curve.x_label)
        .y_axis_label(curve.y_label)
        .height(PLOT_HEIGHT)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name(curve.kind.label().to_uppercase())
                    .color(color)
                    .width(1.5),
            );
        });
}
