use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            // Darker than a typical UI palette so curves stay readable on white PNGs.
            let hsl = Hsl::new(hue, 0.75, 0.42);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-file curve colours
// ---------------------------------------------------------------------------

/// One colour per file in a batch, shared by the on-screen plots and PNG export.
#[derive(Debug, Clone, Default)]
pub struct FilePalette {
    colors: Vec<Color32>,
}

impl FilePalette {
    pub fn new(n_files: usize) -> Self {
        Self {
            colors: generate_palette(n_files),
        }
    }

    /// Colour for the file at `index` in upload order.
    pub fn color_for(&self, index: usize) -> Color32 {
        if self.colors.is_empty() {
            return Color32::LIGHT_BLUE;
        }
        self.colors[index % self.colors.len()]
    }

    pub fn rgb_for(&self, index: usize) -> [u8; 3] {
        let c = self.color_for(index);
        [c.r(), c.g(), c.b()]
    }
}
