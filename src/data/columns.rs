use super::model::{ColumnPick, ColumnRole, ColumnSelection, ParsedTable, PickSource};
use crate::error::{PipelineError, Result};

/// Pick the voltage and current columns.
///
/// The first header starting with `v` (case-insensitive) is voltage, the
/// first starting with `i` is current. A role with no name match falls back
/// to position: column 0 for voltage, column 1 for current. The fallback is
/// not validated and can be wrong for unusual headers ("Bias", "Amps").
pub fn select_columns(table: &ParsedTable) -> Result<ColumnSelection> {
    if table.n_columns() < 2 {
        return Err(PipelineError::Selection {
            columns: table.n_columns(),
        });
    }

    let voltage = pick(table, ColumnRole::Voltage, 'v', 0);
    let current = pick(table, ColumnRole::Current, 'i', 1);

    log::debug!(
        "Selected voltage={:?} ({:?}), current={:?} ({:?})",
        voltage.name,
        voltage.source,
        current.name,
        current.source
    );
    if voltage.index == current.index {
        log::warn!(
            "Voltage and current both resolved to column {:?}",
            voltage.name
        );
    }

    Ok(ColumnSelection { voltage, current })
}

fn pick(table: &ParsedTable, role: ColumnRole, prefix: char, fallback: usize) -> ColumnPick {
    let by_name = table
        .columns
        .iter()
        .position(|c| starts_with_ignore_case(&c.name, prefix));

    let (index, source) = match by_name {
        Some(i) => (i, PickSource::ByName),
        None => (fallback, PickSource::Positional),
    };

    ColumnPick {
        role,
        index,
        name: table.columns[index].name.clone(),
        source,
    }
}

fn starts_with_ignore_case(name: &str, prefix: char) -> bool {
    name.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.to_lowercase().eq(prefix.to_lowercase()))
}
