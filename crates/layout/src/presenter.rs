use crate::error::LayoutError;
use crate::format::{
    format_percentage_error, format_value_with_error, python_repr, round_to_ndigits,
};
use crate::records::{
    CutFlowRow, DatasetSummary, EfficiencyRow, EfficiencyTable, OutOfRange, ReportSection,
    StatisticsRow, StatisticsTable, YieldRow,
};
use analytics::{AnalyticsError, RegionFlow, StatisticalAccount};
use core_types::{CutRecord, DatasetSample, MeasuredSample, Measurement, SelectionItem};
use std::path::{Path, PathBuf};

/// Cut names are cut to this many characters in cut-flow labels.
const LABEL_WIDTH: usize = 45;

/// Turns a `StatisticalAccount` into formatted records, region by region in
/// registration order. It computes nothing itself.
pub struct ResultPresenter<'a> {
    account: &'a StatisticalAccount<'a>,
    base_dir: Option<PathBuf>,
}

enum Step<'s> {
    Cut { position: usize, cut: &'s CutRecord },
    ObjectDefinition(&'s str),
}

impl<'a> ResultPresenter<'a> {
    pub fn new(account: &'a StatisticalAccount<'a>) -> Self {
        Self {
            account,
            base_dir: None,
        }
    }

    /// Event file paths below `dir` are shown relative to it.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn dataset_summary(&self, name: &str) -> Result<DatasetSummary, LayoutError> {
        let dataset = self.dataset(name)?;
        let yields = self.account.dataset_yield(name)?;

        Ok(DatasetSummary {
            name: dataset.name.clone(),
            sample_type: if dataset.background {
                "background"
            } else {
                "signal"
            }
            .to_string(),
            generated_events: yields.global.nevents.to_string(),
            imposed_xsection: dataset
                .has_xsection_override()
                .then(|| python_repr(dataset.xsection)),
            imposed_weight: (dataset.weight != 1.0).then(|| python_repr(dataset.weight)),
            normalization: format!(
                "{} +/- {}",
                yields.normalized.mean as i64, yields.normalized.error as i64
            ),
            event_weight_ratio: round_to_ndigits(yields.event_weight_ratio, 2),
            insufficient_statistics: yields.has_insufficient_statistics(),
        })
    }

    /// One row per event file, plus a `Sum` row for multi-file datasets.
    pub fn formatted_yield(&self, name: &str) -> Result<Vec<YieldRow>, LayoutError> {
        let dataset = self.dataset(name)?;
        let yields = self.account.dataset_yield(name)?;

        let mut rows: Vec<YieldRow> = dataset
            .filenames
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let sample = dataset.measured_detail.get(i).copied().unwrap_or_default();
                self.yield_row(dataset, self.display_path(path), &sample)
            })
            .collect();

        if dataset.filenames.len() > 1 {
            rows.push(self.yield_row(dataset, "Sum".to_string(), &yields.global));
        }
        Ok(rows)
    }

    /// Signal, background and figure of merit before any cut and after each
    /// step of `region`.
    pub fn cut_flow_table(&self, region: &str) -> Result<Vec<CutFlowRow>, LayoutError> {
        let signal = self.account.signal_flow(region)?;
        let background = self.account.background_flow(region)?;

        let row = |label: String, position: Option<usize>| -> Result<CutFlowRow, LayoutError> {
            let cell = |flow: Option<&RegionFlow>| {
                flow.and_then(|f| selected_at(f, position))
                    .map(|m| format_value_with_error(m.mean, m.error))
                    .unwrap_or_default()
            };
            let significance = self
                .account
                .figure_of_merit(region, position)?
                .map(|m| format_value_with_error(m.mean, m.error))
                .unwrap_or_default();
            Ok(CutFlowRow {
                label,
                signal: cell(signal),
                background: cell(background),
                significance,
                object_definition: false,
            })
        };

        let mut rows = vec![row("Initial (no cut)".to_string(), None)?];
        for step in self.region_steps(region) {
            match step {
                Step::Cut { position, cut } => {
                    let label = format!("{}: {}", cut.kind.tag(), truncate(&cut.name));
                    rows.push(row(label, Some(position))?);
                }
                Step::ObjectDefinition(description) => rows.push(CutFlowRow {
                    label: truncate(description),
                    signal: "-".to_string(),
                    background: "-".to_string(),
                    significance: "-".to_string(),
                    object_definition: true,
                }),
            }
        }
        Ok(rows)
    }

    /// Per-dataset counts and efficiencies of the session-wide cut `index`
    /// within `region`.
    pub fn efficiency_table(&self, region: &str, index: usize) -> Result<EfficiencyTable, LayoutError> {
        let flows = self.account.dataset_flows(region)?;
        let session = self.account.session();
        if index >= session.cuts.len() {
            return Err(LayoutError::UnknownCut(index));
        }
        let position = session
            .position_in_region(region, index)
            .ok_or_else(|| LayoutError::CutNotInRegion {
                index,
                region: region.to_string(),
            })?;

        let mut table = EfficiencyTable::default();
        for (yields, flow) in flows {
            let entry = flow.entries.get(position);
            if let Some(entry) = entry {
                table.rows.push(EfficiencyRow {
                    dataset: yields.name.clone(),
                    kept: format_measurement(entry.selected),
                    rejected: format_measurement(entry.rejected),
                    efficiency: format_measurement(entry.efficiency),
                    cumulative_efficiency: format_measurement(entry.cumulative_efficiency),
                });
            }
            // Problems with the counts themselves come before those of the cut.
            table.warnings.extend(
                flow.warnings
                    .iter()
                    .chain(entry.into_iter().flat_map(|e| e.warnings.iter()))
                    .map(|warning| format!("{}: {warning}", yields.name)),
            );
        }
        Ok(table)
    }

    /// Summary statistics of the histogram of `observable`, one row per dataset.
    pub fn statistics_table(&self, observable: &str) -> Result<StatisticsTable, LayoutError> {
        let session = self.account.session();
        let plot = session
            .plots
            .iter()
            .find(|p| p.observable == observable)
            .ok_or_else(|| LayoutError::UnknownObservable(observable.to_string()))?;

        let mut table = StatisticsTable {
            rows: Vec::new(),
            warnings: plot.warnings.clone(),
        };

        for (index, dataset) in session.datasets.iter().enumerate() {
            let Some(summary) = plot.summaries.get(index) else {
                table
                    .warnings
                    .push(format!("{}: no histogram summary recorded", dataset.name));
                continue;
            };
            let scale = self.account.plot_scale(index)?;

            let (underflow, overflow) = if summary.integral != 0.0 {
                (
                    summary.underflow * 100.0 / summary.integral,
                    summary.overflow * 100.0 / summary.integral,
                )
            } else {
                (0.0, 0.0)
            };
            let entries_per_event = if summary.nevents != 0 {
                round_to_ndigits(summary.nentries as f64 / summary.nevents as f64, 3)
            } else {
                "0.".to_string()
            };

            table.rows.push(StatisticsRow {
                dataset: dataset.name.clone(),
                integral: format_value_with_error(summary.integral * scale, 0.0),
                entries_per_event,
                mean: round_to_ndigits(summary.mean, 6),
                rms: round_to_ndigits(summary.rms, 4),
                underflow_percent: round_to_ndigits(underflow, 4),
                overflow_percent: round_to_ndigits(overflow, 4),
                out_of_range: OutOfRange::from_percent(underflow + overflow),
            });
        }
        Ok(table)
    }

    /// The full report: datasets, then one section per selection item in
    /// declaration order, then the cut-flow table of every region.
    pub fn build_report(&self) -> Result<Vec<ReportSection>, LayoutError> {
        let session = self.account.session();
        let mut sections = Vec::new();

        for dataset in &session.datasets {
            sections.push(ReportSection::Dataset {
                summary: self.dataset_summary(&dataset.name)?,
                files: self.formatted_yield(&dataset.name)?,
            });
        }

        for item in &session.selection {
            let section = match item {
                SelectionItem::Histogram { observable } => ReportSection::Histogram {
                    observable: observable.clone(),
                    table: self.statistics_table(observable)?,
                },
                SelectionItem::Cut { index } => {
                    let cut = session
                        .cuts
                        .get(*index)
                        .ok_or(LayoutError::UnknownCut(*index))?;
                    let regions = self
                        .account
                        .regions()
                        .iter()
                        .filter(|region| cut.belongs_to(region))
                        .map(|region| -> Result<_, LayoutError> {
                            Ok((region.clone(), self.efficiency_table(region, *index)?))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    ReportSection::Cut {
                        index: *index,
                        name: cut.name.clone(),
                        regions,
                    }
                }
                SelectionItem::ObjectDefinition { description } => {
                    ReportSection::ObjectDefinition {
                        description: description.clone(),
                    }
                }
            };
            sections.push(section);
        }

        let formula = self.account.config().significance_formula().to_string();
        for region in self.account.regions() {
            sections.push(ReportSection::CutFlow {
                region: region.clone(),
                significance_formula: formula.clone(),
                rows: self.cut_flow_table(region)?,
            });
        }

        tracing::info!(sections = sections.len(), "Report built.");
        Ok(sections)
    }

    fn dataset(&self, name: &str) -> Result<&'a DatasetSample, LayoutError> {
        self.account
            .session()
            .dataset(name)
            .map(|(_, dataset)| dataset)
            .ok_or_else(|| AnalyticsError::UnknownDataset(name.to_string()).into())
    }

    fn yield_row(&self, dataset: &DatasetSample, path: String, sample: &MeasuredSample) -> YieldRow {
        let cross_section = if dataset.has_xsection_override() {
            python_repr(dataset.xsection)
        } else {
            format_percentage_error(
                sample.xsection * dataset.weight,
                sample.xerror * dataset.weight,
            )
        };
        YieldRow {
            path,
            nevents: sample.nevents.to_string(),
            cross_section,
            negative_weights: sample
                .negative_weight_percent()
                .map_or_else(|| "0.0".to_string(), |percent| round_to_ndigits(percent, 2)),
        }
    }

    fn display_path(&self, path: &Path) -> String {
        let relative = match &self.base_dir {
            Some(base) => path.strip_prefix(base).unwrap_or(path),
            None => path,
        };
        relative.display().to_string()
    }

    /// Cuts and object definitions of `region` in declaration order. Cuts the
    /// selection does not list follow in execution order.
    fn region_steps(&self, region: &str) -> Vec<Step<'a>> {
        let session = self.account.session();
        let mut emitted = vec![false; session.cuts_in_region(region).count()];
        let mut steps = Vec::new();

        for item in &session.selection {
            match item {
                SelectionItem::Cut { index } => {
                    let Some(position) = session.position_in_region(region, *index) else {
                        continue;
                    };
                    if !emitted[position] {
                        emitted[position] = true;
                        steps.push(Step::Cut {
                            position,
                            cut: &session.cuts[*index],
                        });
                    }
                }
                SelectionItem::ObjectDefinition { description } => {
                    steps.push(Step::ObjectDefinition(description));
                }
                SelectionItem::Histogram { .. } => {}
            }
        }

        for (position, cut) in session.cuts_in_region(region).enumerate() {
            if !emitted[position] {
                steps.push(Step::Cut { position, cut });
            }
        }
        steps
    }
}

fn selected_at(flow: &RegionFlow, position: Option<usize>) -> Option<Measurement> {
    match position {
        None => Some(flow.initial),
        Some(index) => flow.entries.get(index).map(|e| e.selected),
    }
}

fn format_measurement(m: Measurement) -> String {
    format_value_with_error(m.mean, m.error)
}

fn truncate(text: &str) -> String {
    text.chars().take(LABEL_WIDTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::AnalysisConfiguration;
    use core_types::{
        AnalysisSession, CutCounts, CutKind, DatasetCutFlow, PlotRecord, PlotSummary,
        RegionCounts, WeightedCount, DEFAULT_REGION,
    };
    use std::sync::Arc;

    fn measured(nevents: u64, xsection: f64, sumw_negative: f64) -> MeasuredSample {
        MeasuredSample {
            nevents,
            xsection,
            xerror: 0.0,
            sumw_positive: nevents as f64 - sumw_negative,
            sumw_negative,
        }
    }

    fn flow(initial: u64, selected: u64) -> DatasetCutFlow {
        DatasetCutFlow {
            regions: vec![RegionCounts {
                region: DEFAULT_REGION.to_string(),
                initial: WeightedCount::unweighted(initial),
                cuts: vec![CutCounts {
                    selected: WeightedCount::unweighted(selected),
                    rejected: WeightedCount::unweighted(initial - selected),
                }],
            }],
        }
    }

    fn session() -> AnalysisSession {
        let mut signal = DatasetSample::new("signal", false);
        signal.filenames = vec![PathBuf::from("/data/signal.lhe.gz")];
        signal.measured_detail = vec![measured(1000, 2.0, 0.0)];
        signal.measured_global = Some(measured(1000, 2.0, 0.0));

        let mut background = DatasetSample::new("ttbar", true);
        background.filenames = vec![PathBuf::from("b1.lhe"), PathBuf::from("b2.lhe")];
        background.measured_detail = vec![measured(250, 10.0, 0.0), measured(250, 10.0, 10.0)];

        AnalysisSession {
            datasets: vec![signal, background],
            cuts: vec![CutRecord::new(
                "MET > 100 and a very long name that does not fit in a table",
                CutKind::Select,
            )],
            cutflows: vec![flow(1000, 250), flow(500, 50)],
            plots: vec![PlotRecord {
                observable: "PT(j[1])".to_string(),
                summaries: vec![
                    PlotSummary {
                        integral: 1000.0,
                        nentries: 1000,
                        nevents: 1000,
                        underflow: 10.0,
                        overflow: 40.0,
                        mean: 123.456789,
                        rms: 45.6789,
                    },
                    PlotSummary {
                        nevents: 500,
                        ..Default::default()
                    },
                ],
                warnings: Vec::new(),
            }],
            selection: vec![
                SelectionItem::ObjectDefinition {
                    description: "select j PT > 20".to_string(),
                },
                SelectionItem::Histogram {
                    observable: "PT(j[1])".to_string(),
                },
                SelectionItem::Cut { index: 0 },
            ],
            ..Default::default()
        }
    }

    fn config() -> Arc<AnalysisConfiguration> {
        Arc::new(
            AnalysisConfiguration::default()
                .with_significance_formula("S/sqrt(S+B)")
                .unwrap(),
        )
    }

    #[test]
    fn dataset_summary_reports_normalization() {
        let session = session();
        let account = StatisticalAccount::new(&session, config());
        let presenter = ResultPresenter::new(&account);

        let summary = presenter.dataset_summary("signal").unwrap();
        assert_eq!(summary.sample_type, "signal");
        assert_eq!(summary.generated_events, "1000");
        assert_eq!(summary.normalization, "20000 +/- 0");
        assert_eq!(summary.event_weight_ratio, "20");
        assert!(summary.insufficient_statistics);
        assert_eq!(summary.imposed_xsection, None);

        assert!(matches!(
            presenter.dataset_summary("wjets"),
            Err(LayoutError::Analytics(AnalyticsError::UnknownDataset(_)))
        ));
    }

    #[test]
    fn yield_rows_use_relative_paths_and_a_sum_row() {
        let mut session = session();
        for sample in &mut session.datasets[1].measured_detail {
            sample.xerror = 0.2;
        }
        let account = StatisticalAccount::new(&session, config());
        let presenter = ResultPresenter::new(&account).with_base_dir("/data");

        let signal = presenter.formatted_yield("signal").unwrap();
        assert_eq!(
            signal,
            vec![YieldRow {
                path: "signal.lhe.gz".to_string(),
                nevents: "1000".to_string(),
                cross_section: "2.0".to_string(),
                negative_weights: "0.0".to_string(),
            }]
        );

        let background = presenter.formatted_yield("ttbar").unwrap();
        assert_eq!(background.len(), 3);
        assert_eq!(background[0].cross_section, "10.0 @ 2.0%");
        assert_eq!(background[1].negative_weights, "4.0");
        assert_eq!(background[2].path, "Sum");
        assert_eq!(background[2].nevents, "500");
        assert_eq!(background[2].cross_section, "10.0 @ 1.4%");
        assert_eq!(background[2].negative_weights, "2.0");
    }

    #[test]
    fn imposed_cross_section_is_shown_verbatim() {
        let mut session = session();
        session.datasets[1].xsection = 0.5;
        session.datasets[1].weight = 2.0;
        let account = StatisticalAccount::new(&session, config());
        let presenter = ResultPresenter::new(&account);

        let summary = presenter.dataset_summary("ttbar").unwrap();
        assert_eq!(summary.imposed_xsection.as_deref(), Some("0.5"));
        assert_eq!(summary.imposed_weight.as_deref(), Some("2.0"));
        assert_eq!(summary.normalization, "5000 +/- 0");
        assert!(
            presenter
                .formatted_yield("ttbar")
                .unwrap()
                .iter()
                .all(|row| row.cross_section == "0.5")
        );
    }

    #[test]
    fn cut_flow_table_rows() {
        let session = session();
        let account = StatisticalAccount::new(&session, config());
        let rows = ResultPresenter::new(&account)
            .cut_flow_table(DEFAULT_REGION)
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "Initial (no cut)");
        assert_eq!(rows[0].signal, "20000");
        assert_eq!(rows[0].background, "100000");
        assert_eq!(rows[0].significance, "57.7");

        assert!(rows[1].object_definition);
        assert_eq!(rows[1].label, "select j PT > 20");
        assert_eq!(rows[1].signal, "-");

        assert_eq!(rows[2].label, "SEL: MET > 100 and a very long name that does not ");
        assert_eq!(rows[2].label.chars().count(), 5 + LABEL_WIDTH);
        assert_eq!(rows[2].signal, "5000 +/- 273");
        assert_eq!(rows[2].background, "10000 +/- 1341");
        assert_eq!(rows[2].significance, "40.82 +/- 5.22");
    }

    #[test]
    fn cut_flow_cells_are_blank_without_background() {
        let mut session = session();
        session.datasets.truncate(1);
        session.cutflows.truncate(1);
        let account = StatisticalAccount::new(&session, config());
        let rows = ResultPresenter::new(&account)
            .cut_flow_table(DEFAULT_REGION)
            .unwrap();

        assert_eq!(rows[0].signal, "20000");
        assert_eq!(rows[0].background, "");
        assert_eq!(rows[0].significance, "");
    }

    #[test]
    fn efficiency_table_rows() {
        let session = session();
        let account = StatisticalAccount::new(&session, config());
        let table = ResultPresenter::new(&account)
            .efficiency_table(DEFAULT_REGION, 0)
            .unwrap();

        assert!(table.warnings.is_empty());
        assert_eq!(
            table.rows[0],
            EfficiencyRow {
                dataset: "signal".to_string(),
                kept: "5000 +/- 273".to_string(),
                rejected: "15000 +/- 273".to_string(),
                efficiency: "0.2500 +/- 0.0137".to_string(),
                cumulative_efficiency: "0.2500 +/- 0.0137".to_string(),
            }
        );
        assert_eq!(table.rows[1].kept, "10000 +/- 1341");
        assert_eq!(table.rows[1].rejected, "90000 +/- 1341");
        assert_eq!(table.rows[1].efficiency, "0.1000 +/- 0.0134");
    }

    #[test]
    fn unknown_region_and_cut_are_errors() {
        let session = session();
        let account = StatisticalAccount::new(&session, config());
        let presenter = ResultPresenter::new(&account);

        assert_eq!(
            presenter.cut_flow_table("SR").unwrap_err(),
            LayoutError::Analytics(AnalyticsError::UnknownRegion("SR".to_string()))
        );
        assert_eq!(
            presenter.efficiency_table(DEFAULT_REGION, 4).unwrap_err(),
            LayoutError::UnknownCut(4)
        );
        assert_eq!(
            presenter.statistics_table("ETA(j[1])").unwrap_err(),
            LayoutError::UnknownObservable("ETA(j[1])".to_string())
        );
    }

    #[test]
    fn statistics_table_rows() {
        let session = session();
        let account = StatisticalAccount::new(&session, config());
        let table = ResultPresenter::new(&account)
            .statistics_table("PT(j[1])")
            .unwrap();

        assert_eq!(
            table.rows[0],
            StatisticsRow {
                dataset: "signal".to_string(),
                integral: "20000".to_string(),
                entries_per_event: "1.0".to_string(),
                mean: "123.457".to_string(),
                rms: "45.68".to_string(),
                underflow_percent: "1.0".to_string(),
                overflow_percent: "4.0".to_string(),
                out_of_range: OutOfRange::Low,
            }
        );
        assert_eq!(table.rows[1].integral, "0.0 +/- 0.0");
        assert_eq!(table.rows[1].entries_per_event, "0.0");
        assert_eq!(table.rows[1].underflow_percent, "0.0");
        assert_eq!(table.rows[1].out_of_range, OutOfRange::Low);
    }

    #[test]
    fn statistics_grade_the_share_outside_the_range() {
        let first_row = |underflow: f64, overflow: f64| {
            let mut session = session();
            session.plots[0].summaries[0].underflow = underflow;
            session.plots[0].summaries[0].overflow = overflow;
            let account = StatisticalAccount::new(&session, config());
            ResultPresenter::new(&account)
                .statistics_table("PT(j[1])")
                .unwrap()
                .rows
                .remove(0)
        };

        assert_eq!(first_row(30.0, 50.0).out_of_range, OutOfRange::Moderate);
        assert_eq!(first_row(100.0, 50.0).out_of_range, OutOfRange::Moderate);

        let row = first_row(30.0, 200.0);
        assert_eq!(row.overflow_percent, "20.0");
        assert_eq!(row.out_of_range, OutOfRange::High);
    }

    #[test]
    fn efficiency_warnings_name_their_dataset() {
        let mut session = session();
        // Positive and negative weights cancel before and after the cut.
        session.cutflows[0].regions[0].initial = WeightedCount::new(10, 5.0, 5.0);
        session.cutflows[0].regions[0].cuts[0] = CutCounts {
            selected: WeightedCount::new(6, 3.0, 3.0),
            rejected: WeightedCount::new(4, 2.0, 2.0),
        };
        session.cutflows.truncate(1);
        let account = StatisticalAccount::new(&session, config());
        let table = ResultPresenter::new(&account)
            .efficiency_table(DEFAULT_REGION, 0)
            .unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].kept, "0.0 +/- 0.0");
        assert_eq!(table.rows[0].efficiency, "0.0 +/- 0.0");
        assert_eq!(
            table.warnings,
            vec![
                "signal: cut fraction: the denominator is zero, the value is set to 0",
                "signal: efficiency: the denominator is zero, the value is set to 0",
                "ttbar: cut flow of dataset 'ttbar' in region 'myregion' has 0 cuts, expected 1",
                "ttbar: cut fraction: the denominator is zero, the value is set to 0",
                "ttbar: efficiency: the denominator is zero, the value is set to 0",
            ]
        );
    }

    #[test_log::test]
    fn report_follows_the_selection_order() {
        let session = session();
        let account = StatisticalAccount::new(&session, config());
        let sections = ResultPresenter::new(&account).build_report().unwrap();

        let kinds: Vec<&str> = sections
            .iter()
            .map(|section| match section {
                ReportSection::Dataset { .. } => "dataset",
                ReportSection::Histogram { .. } => "histogram",
                ReportSection::Cut { .. } => "cut",
                ReportSection::ObjectDefinition { .. } => "object",
                ReportSection::CutFlow { .. } => "cutflow",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["dataset", "dataset", "object", "histogram", "cut", "cutflow"]
        );

        match &sections[4] {
            ReportSection::Cut { regions, .. } => {
                assert_eq!(regions.len(), 1);
                assert_eq!(regions[0].0, DEFAULT_REGION);
            }
            other => panic!("unexpected section {other:?}"),
        }
        match &sections[5] {
            ReportSection::CutFlow {
                significance_formula,
                ..
            } => assert_eq!(significance_formula, "S/sqrt(S+B)"),
            other => panic!("unexpected section {other:?}"),
        }
    }
}
