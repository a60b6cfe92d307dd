//! Curve descriptions handed to the plot and PNG sinks.
//!
//! The pipeline works in native units; this module scales to µA and
//! µA/cm² for display.

pub mod raster;

use crate::data::model::Sweep;

/// A → µA, and A/cm² → µA/cm².
pub const MICRO: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Iv,
    Jv,
}

impl CurveKind {
    /// Suffix used in archive entry names.
    pub fn label(self) -> &'static str {
        match self {
            CurveKind::Iv => "iv",
            CurveKind::Jv => "jv",
        }
    }
}

/// Everything needed to draw one curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub kind: CurveKind,
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<[f64; 2]>,
}

/// The I-V curve and, when an area was supplied, the J-V curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSet {
    pub iv: Curve,
    pub jv: Option<Curve>,
}

impl CurveSet {
    pub fn from_sweep(file_name: &str, sweep: &Sweep) -> Self {
        let iv = Curve {
            kind: CurveKind::Iv,
            title: format!("I-V Graph: {file_name}"),
            x_label: "Voltage (V)",
            y_label: "Current (µA)",
            points: scaled_points(&sweep.voltage, &sweep.current),
        };
        let jv = sweep.density.as_ref().map(|density| Curve {
            kind: CurveKind::Jv,
            title: format!("J-V Graph: {file_name}"),
            x_label: "Voltage (V)",
            y_label: "Current Density (µA/cm²)",
            points: scaled_points(&sweep.voltage, density),
        });
        Self { iv, jv }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Curve> {
        std::iter::once(&self.iv).chain(self.jv.as_ref())
    }
}

fn scaled_points(x: &[f64], y: &[f64]) -> Vec<[f64; 2]> {
    x.iter().zip(y).map(|(&x, &y)| [x, y * MICRO]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_are_scaled_to_micro_units() {
        let sweep = Sweep {
            voltage: vec![0.0, 1.0],
            current: vec![1e-6, 2e-6],
            density: Some(vec![1.0, 2.0]),
        };
        let curves = CurveSet::from_sweep("d1.csv", &sweep);

        assert_eq!(curves.iv.title, "I-V Graph: d1.csv");
        assert_eq!(curves.iv.y_label, "Current (µA)");
        assert!((curves.iv.points[1][1] - 2.0).abs() < 1e-9);

        let jv = curves.jv.as_ref().unwrap();
        assert_eq!(jv.title, "J-V Graph: d1.csv");
        assert_eq!(jv.points[1], [1.0, 2e6]);
        assert_eq!(curves.iter().count(), 2);
    }

    #[test]
    fn no_density_means_no_jv_curve() {
        let sweep = Sweep {
            voltage: vec![0.0],
            current: vec![1.0],
            density: None,
        };
        let curves = CurveSet::from_sweep("d2.txt", &sweep);
        assert!(curves.jv.is_none());
        assert_eq!(curves.iter().map(|c| c.kind.label()).collect::<Vec<_>>(), vec!["iv"]);
    }
}
