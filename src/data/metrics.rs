use super::model::{Area, Column, DerivedSeries, Sweep};

/// Current density J = I / A(cm²), row for row.
///
/// A missing current yields a missing density in the same row. Output is in
/// the table's native current unit per cm²; display scaling happens in the
/// renderer.
pub fn current_density(current: &Column, area: Area) -> DerivedSeries {
    let area_cm2 = area.cm2();
    DerivedSeries {
        values: current
            .values
            .iter()
            .map(|i| i.map(|i| i / area_cm2))
            .collect(),
    }
}

/// Keep only rows where both voltage and current are present.
///
/// Density, when given, is filtered with the same row mask so the three
/// series stay aligned.
pub fn paired_sweep(voltage: &Column, current: &Column, density: Option<&DerivedSeries>) -> Sweep {
    let mut sweep = Sweep {
        density: density.map(|_| Vec::new()),
        ..Sweep::default()
    };

    for (row, (v, i)) in voltage.values.iter().zip(&current.values).enumerate() {
        let (Some(v), Some(i)) = (v, i) else {
            continue;
        };
        sweep.voltage.push(*v);
        sweep.current.push(*i);
        if let (Some(out), Some(series)) = (sweep.density.as_mut(), density) {
            // Present current implies present density.
            out.push(series.values[row].unwrap_or(f64::NAN));
        }
    }

    sweep
}
