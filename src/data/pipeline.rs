use super::columns::select_columns;
use super::decode::decode;
use super::loader::parse_table;
use super::metrics::{current_density, paired_sweep};
use super::model::{Area, ColumnSelection, DerivedSeries, ParsedTable, RawUpload, Sweep};
use super::observe::{observe, ObservationSet};
use crate::error::Result;
use crate::render::CurveSet;

// ---------------------------------------------------------------------------
// Per-file result
// ---------------------------------------------------------------------------

/// Everything produced for one successfully processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAnalysis {
    pub name: String,
    pub table: ParsedTable,
    pub selection: ColumnSelection,
    /// Row-aligned with `table`; `None` when no area was supplied.
    pub density: Option<DerivedSeries>,
    pub sweep: Sweep,
    pub observations: ObservationSet,
    pub curves: CurveSet,
    /// Undecodable bytes skipped while reading the upload.
    pub dropped_bytes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingResult {
    Success(Box<FileAnalysis>),
    Failure { name: String, message: String },
}

impl ProcessingResult {
    pub fn name(&self) -> &str {
        match self {
            ProcessingResult::Success(analysis) => &analysis.name,
            ProcessingResult::Failure { name, .. } => name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success(_))
    }
}

/// Results in upload order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub results: Vec<ProcessingResult>,
    pub area: Option<Area>,
}

impl BatchReport {
    pub fn successes(&self) -> impl Iterator<Item = &FileAnalysis> {
        self.results.iter().filter_map(|r| match r {
            ProcessingResult::Success(analysis) => Some(analysis.as_ref()),
            ProcessingResult::Failure { .. } => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Decode → parse → select → derive → observe for a single upload.
///
/// Density is computed only when `area` is given.
pub fn process_upload(upload: &RawUpload, area: Option<Area>) -> Result<FileAnalysis> {
    let decoded = decode(&upload.bytes);
    let table = parse_table(&decoded.text)?;
    let selection = select_columns(&table)?;

    let voltage = &table.columns[selection.voltage.index];
    let current = &table.columns[selection.current.index];
    let density = area.map(|area| current_density(current, area));
    let sweep = paired_sweep(voltage, current, density.as_ref());
    if sweep.is_empty() {
        log::warn!(
            "{}: no rows with both {:?} and {:?} present",
            upload.name,
            voltage.name,
            current.name
        );
    }

    let observations = observe(&sweep);
    let curves = CurveSet::from_sweep(&upload.name, &sweep);

    Ok(FileAnalysis {
        name: upload.name.clone(),
        table,
        selection,
        density,
        sweep,
        observations,
        curves,
        dropped_bytes: decoded.dropped_bytes,
    })
}

/// Process uploads one at a time; a failing file is recorded and skipped.
pub fn process_batch(uploads: &[RawUpload], area: Option<Area>) -> BatchReport {
    let results = uploads
        .iter()
        .map(|upload| match process_upload(upload, area) {
            Ok(analysis) => {
                log::debug!(
                    "{}: {} points, {} observations",
                    analysis.name,
                    analysis.sweep.len(),
                    analysis.observations.len()
                );
                ProcessingResult::Success(Box::new(analysis))
            }
            Err(e) => {
                log::warn!("Failed to process {}: {e}", upload.name);
                ProcessingResult::Failure {
                    name: upload.name.clone(),
                    message: e.to_string(),
                }
            }
        })
        .collect();

    let report = BatchReport { results, area };
    log::info!(
        "Processed {} files ({} failed), area {}",
        report.results.len(),
        report.failure_count(),
        area.map_or_else(|| "not set".to_string(), |a| format!("{} µm²", a.um2()))
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PickSource;
    use crate::data::observe::Observation;
    use crate::error::PipelineError;

    const FORWARD: &str = "V,I\n0.0,1e-7\n0.5,2e-6\n1.0,5e-5";

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn forward_sweep_scenario() {
        let area = Area::from_um2(100.0).unwrap();
        assert!(close(area.cm2(), 1e-6));

        let analysis = process_upload(&RawUpload::new("fwd.csv", FORWARD), Some(area)).unwrap();
        let density = analysis.sweep.density.as_ref().unwrap();
        for (got, want) in density.iter().zip([0.1, 2.0, 50.0]) {
            assert!(close(*got, want), "{got} vs {want}");
        }
        assert_eq!(
            analysis.observations,
            vec![Observation::ForwardConduction, Observation::HighDensity]
        );
        assert!(analysis.curves.jv.is_some());
    }

    #[test]
    fn without_area_density_stage_is_skipped() {
        let analysis = process_upload(&RawUpload::new("fwd.csv", FORWARD), None).unwrap();
        assert!(analysis.density.is_none());
        assert!(analysis.sweep.density.is_none());
        assert!(analysis.curves.jv.is_none());
        assert_eq!(analysis.observations, vec![Observation::ForwardConduction]);
    }

    #[test]
    fn all_negative_current_reports_reverse_bias() {
        let upload = RawUpload::new("rev.txt", "V\tI\n-1\t-3e-9\n-0.5\t-1e-9\n0\t-1e-12\n");
        let analysis = process_upload(&upload, Area::from_um2(50.0).ok()).unwrap();
        assert!(analysis.observations.contains(&Observation::ReverseBias));
        assert!(!analysis.observations.contains(&Observation::ForwardConduction));
    }

    #[test]
    fn bad_current_cell_excluded_from_sweep_but_voltage_kept() {
        let upload = RawUpload::new("gap.csv", "V,I\n0.0,1e-7\n0.5,oops\n1.0,5e-5\n");
        let analysis = process_upload(&upload, Area::from_um2(100.0).ok()).unwrap();

        let voltage = &analysis.table.columns[analysis.selection.voltage.index];
        let present: Vec<f64> = voltage.values.iter().flatten().copied().collect();
        assert_eq!(present, vec![0.0, 0.5, 1.0]);
        assert_eq!(analysis.density.as_ref().unwrap().values[1], None);
        assert_eq!(analysis.sweep.voltage, vec![0.0, 1.0]);
        assert_eq!(analysis.sweep.density.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn rows_without_pairs_give_empty_observations() {
        let upload = RawUpload::new("holes.csv", "V,I\n1,\n,2\n");
        let analysis = process_upload(&upload, Area::from_um2(1.0).ok()).unwrap();
        assert!(analysis.sweep.is_empty());
        assert!(analysis.observations.is_empty());
    }

    #[test]
    fn positional_fallback_is_visible_in_result() {
        let upload = RawUpload::new("bias.txt", "Bias Amps\n0 1e-3\n1 2e-3\n");
        let analysis = process_upload(&upload, None).unwrap();
        assert_eq!(analysis.selection.voltage.source, PickSource::Positional);
        assert_eq!(analysis.selection.current.name, "Amps");
    }

    #[test]
    fn repeated_runs_are_identical() {
        let upload = RawUpload::new("fwd.csv", FORWARD);
        let area = Area::from_um2(100.0).ok();
        let a = process_upload(&upload, area).unwrap();
        let b = process_upload(&upload, area).unwrap();
        assert_eq!(a.observations, b.observations);
        assert_eq!(a.density, b.density);
        assert_eq!(a, b);
    }

    #[test]
    fn single_column_is_a_selection_failure() {
        let err = process_upload(&RawUpload::new("one.txt", "V\n1\n2\n"), None).unwrap_err();
        assert_eq!(err, PipelineError::Selection { columns: 1 });
    }

    #[test]
    fn failing_file_does_not_stop_the_batch() {
        let uploads = vec![
            RawUpload::new("first.csv", FORWARD),
            RawUpload::new("empty.txt", ""),
            RawUpload::new("last.txt", "V I\n0 0\n1 0.002"),
        ];
        let report = process_batch(&uploads, Area::from_um2(100.0).ok());

        assert_eq!(report.results.len(), 3);
        assert_eq!(
            report.results.iter().map(ProcessingResult::name).collect::<Vec<_>>(),
            vec!["first.csv", "empty.txt", "last.txt"]
        );
        assert!(report.results[0].is_success());
        assert!(matches!(
            &report.results[1],
            ProcessingResult::Failure { name, message }
                if name == "empty.txt" && message.contains("empty")
        ));
        assert!(report.results[2].is_success());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.successes().count(), 2);
    }
}
