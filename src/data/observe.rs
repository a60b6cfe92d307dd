use std::fmt;

use super::model::Sweep;

/// Peak current above this (native unit) counts as strong forward conduction.
pub const FORWARD_CURRENT_THRESHOLD: f64 = 1e-6;
/// Minimum current below this (native unit) hints at leakage.
pub const LEAKAGE_CURRENT_THRESHOLD: f64 = -1e-6;
/// Peak density above this (native unit / cm²) counts as high.
pub const HIGH_DENSITY_THRESHOLD: f64 = 0.01;

/// One qualitative note about a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    ReverseBias,
    ForwardConduction,
    HighDensity,
    Leakage,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Observation::ReverseBias => "This diode operates under reverse bias conditions.",
            Observation::ForwardConduction => "The diode shows a strong forward bias conduction.",
            Observation::HighDensity => {
                "High current density suggests a small area or good conductivity."
            }
            Observation::Leakage => "Possible leakage or reverse saturation detected.",
        };
        f.write_str(text)
    }
}

pub type ObservationSet = Vec<Observation>;

/// Evaluate the threshold rules in fixed order.
///
/// Rules are independent; any subset may fire. The density rule is skipped
/// when the sweep carries no density. An empty sweep has no extrema and
/// yields no observations.
pub fn observe(sweep: &Sweep) -> ObservationSet {
    let mut notes = Vec::new();
    let (Some(max_i), Some(min_i)) = (max(&sweep.current), min(&sweep.current)) else {
        return notes;
    };

    if max_i < 0.0 {
        notes.push(Observation::ReverseBias);
    }
    if max_i > FORWARD_CURRENT_THRESHOLD {
        notes.push(Observation::ForwardConduction);
    }
    if let Some(max_j) = sweep.density.as_deref().and_then(max) {
        if max_j > HIGH_DENSITY_THRESHOLD {
            notes.push(Observation::HighDensity);
        }
    }
    if min_i < LEAKAGE_CURRENT_THRESHOLD {
        notes.push(Observation::Leakage);
    }

    notes
}

fn max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}

fn min(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
}
