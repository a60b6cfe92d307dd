use std::io::Cursor;
use std::ops::Range;
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::register_font;

use super::Curve;
use crate::config::RenderConfig;

const FONT_FAMILY: &str = "sans-serif";

// ---------------------------------------------------------------------------
// PNG rendering
// ---------------------------------------------------------------------------

/// Render a curve as a titled, labelled line chart and encode it as PNG.
pub fn render_png(curve: &Curve, config: &RenderConfig, color: [u8; 3]) -> Result<Vec<u8>> {
    let pixels = draw(curve, config, RGBColor(color[0], color[1], color[2]))
        .with_context(|| format!("drawing {:?}", curve.title))?;
    let img = RgbImage::from_raw(config.width, config.height, pixels)
        .context("chart buffer does not match image size")?;

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .with_context(|| format!("encoding PNG for {:?}", curve.title))?;
    Ok(bytes)
}

/// Draw into a raw RGB buffer of `width * height * 3` bytes.
fn draw(curve: &Curve, config: &RenderConfig, color: RGBColor) -> Result<Vec<u8>> {
    embedded_font()?;

    let points: Vec<(f64, f64)> = curve
        .points
        .iter()
        .filter(|[x, y]| x.is_finite() && y.is_finite())
        .map(|&[x, y]| (x, y))
        .collect();
    let x_range = axis_range(points.iter().map(|p| p.0));
    let y_range = axis_range(points.iter().map(|p| p.1));

    let mut buf = vec![0u8; config.width as usize * config.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (config.width, config.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&curve.title, (FONT_FAMILY, 22))
            .margin(config.margin)
            .x_label_area_size(45)
            .y_label_area_size(75)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(curve.x_label)
            .y_desc(curve.y_label)
            .axis_desc_style((FONT_FAMILY, 16))
            .label_style((FONT_FAMILY, 13))
            .draw()?;

        chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?;
        root.present()?;
    }
    Ok(buf)
}

/// Register the bundled sans-serif face once; charts never touch system fonts.
fn embedded_font() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        register_font(
            FONT_FAMILY,
            FontStyle::Normal,
            epaint_default_fonts::UBUNTU_LIGHT,
        )
        .is_ok()
    });
    if !ok {
        bail!("bundled chart font could not be loaded");
    }
    Ok(())
}

/// Data span padded by 5%; flat or empty series get a non-zero span.
fn axis_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return -1.0..1.0;
    }
    let span = hi - lo;
    if span > 0.0 && span.is_finite() {
        let pad = span * 0.05;
        (lo - pad)..(hi + pad)
    } else {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.5 };
        (lo - pad)..(hi + pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CurveKind;

    fn curve(title: &str, x_label: &'static str, y_label: &'static str) -> Curve {
        Curve {
            kind: CurveKind::Iv,
            title: title.into(),
            x_label,
            y_label,
            points: vec![[0.0, 0.1], [0.5, 2.0], [1.0, 50.0]],
        }
    }

    fn small() -> RenderConfig {
        RenderConfig {
            width: 320,
            height: 240,
            margin: 10,
        }
    }

    fn iv() -> Curve {
        curve("I-V Graph: a.csv", "Voltage (V)", "Current (µA)")
    }

    #[test]
    fn encodes_a_png_of_configured_size() {
        let bytes = render_png(&iv(), &small(), [200, 0, 0]).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn title_and_axis_labels_reach_the_image() {
        let base = render_png(&iv(), &small(), [200, 0, 0]).unwrap();
        let retitled =
            render_png(&curve("totally different", "Voltage (V)", "Current (µA)"), &small(), [200, 0, 0])
                .unwrap();
        let relabelled = render_png(&curve("I-V Graph: a.csv", "", ""), &small(), [200, 0, 0]).unwrap();

        assert_ne!(base, retitled);
        assert_ne!(base, relabelled);
        assert_eq!(base, render_png(&iv(), &small(), [200, 0, 0]).unwrap());
    }

    #[test]
    fn line_uses_curve_colour() {
        let pixels = draw(&iv(), &small(), RGBColor(0, 0, 255)).unwrap();
        assert!(pixels.chunks_exact(3).any(|p| p == [0, 0, 255]));
    }

    #[test]
    fn empty_and_flat_curves_still_render() {
        let mut empty = iv();
        empty.points.clear();
        assert!(render_png(&empty, &small(), [0, 0, 255]).is_ok());

        let mut flat = iv();
        flat.points = vec![[1.0, 2.0], [1.0, 2.0], [f64::NAN, 1.0]];
        assert!(render_png(&flat, &small(), [0, 0, 255]).is_ok());
    }

    #[test]
    fn axis_range_pads_and_never_collapses() {
        assert_eq!(axis_range([0.0, 10.0].into_iter()), -0.5..10.5);
        assert_eq!(axis_range([0.0].into_iter()), -1.0..1.0);
        assert_eq!(axis_range([4.0].into_iter()), 2.0..6.0);
        assert_eq!(axis_range(std::iter::empty()), -1.0..1.0);
    }
}
