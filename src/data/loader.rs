use std::collections::HashSet;

use csv::{ReaderBuilder, Trim};

use super::model::{Column, Layout, ParseReport, ParsedTable};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse decoded text into a numeric table.
///
/// Only the first line is inspected to pick the layout:
/// * contains a tab   → tab-delimited, first record is the header
/// * contains a comma → comma-delimited, first record is the header
/// * otherwise        → whitespace-separated, first non-empty line is the header
///
/// Cells that are not numbers become missing values; rows with no value at
/// all are dropped. Only structural problems (no lines, no numeric rows,
/// records wider than the header) are errors.
pub fn parse_table(text: &str) -> Result<ParsedTable> {
    let first_line = text
        .lines()
        .next()
        .ok_or_else(|| PipelineError::Parse("input is empty".into()))?;

    let layout = detect_layout(first_line);
    let (headers, rows) = match layout.delimiter() {
        Some(delimiter) => read_delimited(text, delimiter)?,
        None => read_whitespace(text)?,
    };

    let table = build_table(layout, headers, rows)?;
    log::debug!(
        "Parsed {} table: {} columns × {} rows, {} coerced cells, {} dropped rows",
        table.report.layout,
        table.n_columns(),
        table.n_rows(),
        table.report.coerced_cells,
        table.report.dropped_rows
    );
    Ok(table)
}

/// Tab wins over comma; anything else is whitespace-separated.
pub fn detect_layout(first_line: &str) -> Layout {
    if first_line.contains('\t') {
        Layout::Tab
    } else if first_line.contains(',') {
        Layout::Comma
    } else {
        Layout::Whitespace
    }
}

// ---------------------------------------------------------------------------
// Delimited reader
// ---------------------------------------------------------------------------

type RawGrid = (Vec<String>, Vec<Vec<String>>);

fn read_delimited(text: &str, delimiter: u8) -> Result<RawGrid> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::Parse(format!("reading header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| PipelineError::Parse(format!("reading record: {e}")))?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(PipelineError::Parse(format!(
                "line {line}: expected {} fields, saw {}",
                headers.len(),
                record.len()
            )));
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok((headers, rows))
}

// ---------------------------------------------------------------------------
// Whitespace reader
// ---------------------------------------------------------------------------

fn read_whitespace(text: &str) -> Result<RawGrid> {
    let mut lines = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<String>>()
        });

    let mut headers = lines
        .next()
        .ok_or_else(|| PipelineError::Parse("input has no non-empty lines".into()))?;
    let rows: Vec<Vec<String>> = lines.collect();

    // Wider data rows get generated names for the extra columns.
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    while headers.len() < width {
        headers.push(String::new());
    }

    Ok((headers, rows))
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

fn build_table(layout: Layout, headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<ParsedTable> {
    let names = unique_names(headers);
    let width = names.len();
    let mut report = ParseReport::new(layout);
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(rows.len()); width];

    for row in &rows {
        report.padded_cells += width.saturating_sub(row.len());

        let cells: Vec<Option<f64>> = (0..width)
            .map(|i| {
                let raw = row.get(i).map_or("", |s| s.as_str());
                let value = coerce_cell(raw);
                if value.is_none() && !raw.trim().is_empty() {
                    report.coerced_cells += 1;
                }
                value
            })
            .collect();

        if cells.iter().all(Option::is_none) {
            report.dropped_rows += 1;
            continue;
        }
        for (column, cell) in values.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    if values.first().map_or(true, Vec::is_empty) {
        return Err(PipelineError::Parse("no numeric rows found".into()));
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column { name, values })
        .collect();

    Ok(ParsedTable { columns, report })
}

/// Parse one cell; blanks, junk and NaN are all missing.
pub fn coerce_cell(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Fill blank names with `column_{n}` and suffix repeats with `.1`, `.2`, …
fn unique_names(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let base = match name.trim() {
                "" => format!("column_{i}"),
                trimmed => trimmed.to_string(),
            };
            let mut candidate = base.clone();
            let mut k = 1;
            while seen.contains(&candidate) {
                candidate = format!("{base}.{k}");
                k += 1;
            }
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: &[Option<f64>], b: &[Option<f64>]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| match (x, y) {
                (Some(x), Some(y)) => (x - y).abs() <= 1e-12 * x.abs().max(y.abs()).max(1.0),
                (None, None) => true,
                _ => false,
            })
    }

    #[test]
    fn detects_layout_from_first_line_only() {
        assert_eq!(detect_layout("V\tI"), Layout::Tab);
        assert_eq!(detect_layout("V,I"), Layout::Comma);
        assert_eq!(detect_layout("V\tI,extra"), Layout::Tab);
        assert_eq!(detect_layout("V I"), Layout::Whitespace);
        assert_eq!(detect_layout(""), Layout::Whitespace);
    }

    #[test]
    fn whitespace_file_uses_first_line_as_header() {
        let table = parse_table("V I\n0 0\n1 0.002").unwrap();
        assert_eq!(table.report.layout, Layout::Whitespace);
        assert_eq!(table.column_names(), vec!["V", "I"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.columns[0].values, vec![Some(0.0), Some(1.0)]);
        assert_eq!(table.columns[1].values, vec![Some(0.0), Some(0.002)]);
    }

    #[test]
    fn tab_comma_and_whitespace_renditions_agree() {
        let tab = parse_table("V\tI\n0.0\t1e-7\n0.5\t2e-6\n1.0\t5e-5\n").unwrap();
        let comma = parse_table("V,I\n0.0,1e-7\n0.5,2e-6\n1.0,5e-5\n").unwrap();
        let ws = parse_table("V   I\n0.0  1e-7\n\n0.5 2e-6\n  1.0\t5e-5\n").unwrap();

        for other in [&comma, &ws] {
            assert_eq!(tab.column_names(), other.column_names());
            for (a, b) in tab.columns.iter().zip(&other.columns) {
                assert!(approx_eq(&a.values, &b.values));
            }
        }
        assert_eq!(tab.report.layout, Layout::Tab);
        assert_eq!(comma.report.layout, Layout::Comma);
        assert_eq!(ws.report.layout, Layout::Whitespace);
    }

    #[test]
    fn bad_cells_degrade_to_missing_and_are_counted() {
        let table = parse_table("V,I\n0.0,abc\n0.5,2e-6\n").unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.columns[0].values, vec![Some(0.0), Some(0.5)]);
        assert_eq!(table.columns[1].values, vec![None, Some(2e-6)]);
        assert_eq!(table.report.coerced_cells, 1);
        assert!(!table.report.is_clean());
    }

    #[test]
    fn all_missing_rows_are_dropped() {
        let table = parse_table("V,I\nfoo,bar\n1,2\n,\n").unwrap();
        assert_eq!(table.n_rows(), 1);
        assert_eq!(table.report.dropped_rows, 2);
        assert_eq!(table.report.coerced_cells, 2);
    }

    #[test]
    fn nan_text_counts_as_missing() {
        assert_eq!(coerce_cell("NaN"), None);
        assert_eq!(coerce_cell(" 1.5e-3 "), Some(1.5e-3));
        assert_eq!(coerce_cell("-inf"), Some(f64::NEG_INFINITY));
        assert_eq!(coerce_cell(""), None);
    }

    #[test]
    fn short_rows_are_padded() {
        let table = parse_table("V,I,T\n1,2\n3,4,5\n").unwrap();
        assert_eq!(table.columns[2].values, vec![None, Some(5.0)]);
        assert_eq!(table.report.padded_cells, 1);
    }

    #[test]
    fn wide_delimited_record_is_an_error() {
        let err = parse_table("V,I\n1,2,3\n").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(msg) if msg.contains("expected 2 fields")));
    }

    #[test]
    fn wide_whitespace_row_gets_generated_column_name() {
        let table = parse_table("V I\n1 2 3\n4 5\n").unwrap();
        assert_eq!(table.column_names(), vec!["V", "I", "column_2"]);
        assert_eq!(table.columns[2].values, vec![Some(3.0), None]);
    }

    #[test]
    fn duplicate_and_blank_headers_are_made_unique() {
        let table = parse_table("V,V,,I\n1,2,3,4\n").unwrap();
        assert_eq!(table.column_names(), vec!["V", "V.1", "column_2", "I"]);
    }

    #[test]
    fn header_names_are_trimmed() {
        let table = parse_table("V , I\n1, 2\n").unwrap();
        assert_eq!(table.column_names(), vec!["V", "I"]);
    }

    #[test]
    fn empty_inputs_fail_to_parse() {
        assert!(matches!(parse_table(""), Err(PipelineError::Parse(_))));
        assert!(matches!(parse_table("\n  \n"), Err(PipelineError::Parse(_))));
    }

    #[test]
    fn non_numeric_content_fails_to_parse() {
        assert!(parse_table("V,I\n").is_err());
        assert!(parse_table("Voltage Current\nhigh low\n").is_err());
    }

    #[test]
    fn single_column_still_parses() {
        let table = parse_table("V\n1\n2\n").unwrap();
        assert_eq!(table.n_columns(), 1);
        assert_eq!(table.n_rows(), 2);
    }
}
