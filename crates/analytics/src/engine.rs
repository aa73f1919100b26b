use crate::error::{AggregationWarning, AnalyticsError, RatioKind};
use crate::measure::{
    aggregate_dataset, checked_ratio, dataset_cross_section, efficiency, scale_to_luminosity,
    scaled_fraction,
};
use crate::report::{CutFlowEntry, DatasetYield, RegionFlow};
use configuration::AnalysisConfiguration;
use core_types::{
    AnalysisSession, CutCounts, DatasetSample, Measurement, NormalizeType, WeightedCount,
};
use formula::Variables;
use std::sync::Arc;

/// Normalized yields and cut flows of one analysis session.
///
/// Everything is computed once, at construction, against a single
/// configuration snapshot. Later configuration changes do not affect an
/// existing account.
#[derive(Debug)]
pub struct StatisticalAccount<'a> {
    session: &'a AnalysisSession,
    config: Arc<AnalysisConfiguration>,
    regions: Vec<String>,
    yields: Vec<DatasetYield>,
    /// `[dataset][region]`, regions in registration order.
    flows: Vec<Vec<RegionFlow>>,
    signal: Option<Vec<RegionFlow>>,
    background: Option<Vec<RegionFlow>>,
}

impl<'a> StatisticalAccount<'a> {
    pub fn new(session: &'a AnalysisSession, config: Arc<AnalysisConfiguration>) -> Self {
        let regions: Vec<String> = session
            .region_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let yields: Vec<DatasetYield> = session
            .datasets
            .iter()
            .map(|dataset| dataset_yield(dataset, config.lumi()))
            .collect();

        let flows: Vec<Vec<RegionFlow>> = session
            .datasets
            .iter()
            .zip(&yields)
            .enumerate()
            .map(|(index, (dataset, yields))| {
                regions
                    .iter()
                    .map(|region| normalize_region(session, index, dataset, yields, region, &config))
                    .collect()
            })
            .collect();

        let signal = session
            .has_signal()
            .then(|| combine_class(session, &flows, regions.len(), false));
        let background = session
            .has_background()
            .then(|| combine_class(session, &flows, regions.len(), true));

        for (dataset, yields) in session.datasets.iter().zip(&yields) {
            tracing::debug!(
                dataset = %dataset.name,
                nlumi = yields.normalized.mean,
                error = yields.normalized.error,
                ratio = yields.event_weight_ratio,
                "Normalized dataset to the luminosity."
            );
            for warning in &yields.warnings {
                tracing::warn!(dataset = %dataset.name, "{warning}");
            }
        }
        for (dataset, per_region) in session.datasets.iter().zip(&flows) {
            for flow in per_region {
                for warning in flow.all_warnings() {
                    tracing::warn!(dataset = %dataset.name, region = %flow.region, "{warning}");
                }
            }
        }

        Self {
            session,
            config,
            regions,
            yields,
            flows,
            signal,
            background,
        }
    }

    pub fn session(&self) -> &AnalysisSession {
        self.session
    }

    /// The configuration snapshot this account was computed with.
    pub fn config(&self) -> &AnalysisConfiguration {
        &self.config
    }

    /// Regions in registration order.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Parallel to the session's datasets.
    pub fn yields(&self) -> &[DatasetYield] {
        &self.yields
    }

    pub fn dataset_yield(&self, name: &str) -> Result<&DatasetYield, AnalyticsError> {
        self.yields
            .iter()
            .find(|y| y.name == name)
            .ok_or_else(|| AnalyticsError::UnknownDataset(name.to_string()))
    }

    /// The cut flow of every dataset in `region`, in dataset order.
    pub fn dataset_flows(
        &self,
        region: &str,
    ) -> Result<impl Iterator<Item = (&DatasetYield, &RegionFlow)>, AnalyticsError> {
        let r = self.region_index(region)?;
        Ok(self
            .yields
            .iter()
            .zip(&self.flows)
            .map(move |(yields, flows)| (yields, &flows[r])))
    }

    pub fn region_flow(&self, dataset: &str, region: &str) -> Result<&RegionFlow, AnalyticsError> {
        let r = self.region_index(region)?;
        let d = self
            .yields
            .iter()
            .position(|y| y.name == dataset)
            .ok_or_else(|| AnalyticsError::UnknownDataset(dataset.to_string()))?;
        Ok(&self.flows[d][r])
    }

    /// Sum of all signal datasets in `region`; `None` without signal.
    pub fn signal_flow(&self, region: &str) -> Result<Option<&RegionFlow>, AnalyticsError> {
        let r = self.region_index(region)?;
        Ok(self.signal.as_ref().map(|flows| &flows[r]))
    }

    /// Sum of all background datasets in `region`; `None` without background.
    pub fn background_flow(&self, region: &str) -> Result<Option<&RegionFlow>, AnalyticsError> {
        let r = self.region_index(region)?;
        Ok(self.background.as_ref().map(|flows| &flows[r]))
    }

    /// Evaluates the configured significance and error formulas.
    pub fn combine_signal_background(
        &self,
        background: Measurement,
        signal: Measurement,
    ) -> Measurement {
        let vars = Variables::new(signal.mean, background.mean, signal.error, background.error);
        Measurement::new(
            self.config.significance_formula().evaluate(vars),
            self.config.error_formula().evaluate(vars),
        )
    }

    /// The figure of merit after the cut at `position` in `region` (before any
    /// cut for `None`). Blank, i.e. `None`, unless the session has both signal
    /// and background.
    pub fn figure_of_merit(
        &self,
        region: &str,
        position: Option<usize>,
    ) -> Result<Option<Measurement>, AnalyticsError> {
        let (Some(signal), Some(background)) =
            (self.signal_flow(region)?, self.background_flow(region)?)
        else {
            return Ok(None);
        };
        let pick = |flow: &RegionFlow| -> Result<Measurement, AnalyticsError> {
            match position {
                None => Ok(flow.initial),
                Some(index) => flow.entries.get(index).map(|e| e.selected).ok_or_else(|| {
                    AnalyticsError::CutOutOfRange {
                        region: region.to_string(),
                        index,
                        len: flow.entries.len(),
                    }
                }),
            }
        };
        Ok(Some(self.combine_signal_background(pick(background)?, pick(signal)?)))
    }

    /// Factor turning raw histogram contents of a dataset into expected
    /// yields: 1 without normalization, `N0/n0` otherwise.
    pub fn plot_scale(&self, dataset: usize) -> Result<f64, AnalyticsError> {
        let (sample, yields) = self
            .session
            .datasets
            .get(dataset)
            .zip(self.yields.get(dataset))
            .ok_or_else(|| AnalyticsError::UnknownDataset(format!("#{dataset}")))?;

        let Some(target) = luminosity_initial(sample, yields, &self.config) else {
            return Ok(1.0);
        };
        let generated = {
            let net = yields.global.sumw_positive - yields.global.sumw_negative;
            if net != 0.0 { net } else { yields.global.nevents as f64 }
        };
        Ok(if generated > 0.0 {
            target.mean / generated
        } else {
            1.0
        })
    }

    fn region_index(&self, region: &str) -> Result<usize, AnalyticsError> {
        self.regions
            .iter()
            .position(|r| r == region)
            .ok_or_else(|| AnalyticsError::UnknownRegion(region.to_string()))
    }
}

fn dataset_yield(dataset: &DatasetSample, lumi: f64) -> DatasetYield {
    let global = dataset
        .measured_global
        .unwrap_or_else(|| aggregate_dataset(&dataset.measured_detail));
    let cross_section = dataset_cross_section(dataset, &global);

    let normalized = if dataset.has_xsection_override() {
        scale_to_luminosity(dataset.xsection, 0.0, 1.0, lumi)
    } else {
        scale_to_luminosity(global.xsection, global.xerror, dataset.weight, lumi)
    };

    let event_weight_ratio = if global.nevents == 0 {
        0.0
    } else {
        normalized.mean / global.nevents as f64 * dataset.weight
    };

    let mut warnings = Vec::new();
    if event_weight_ratio > 1.0 {
        warnings.push(AggregationWarning::InsufficientStatistics {
            ratio: event_weight_ratio,
        });
    }

    DatasetYield {
        name: dataset.name.clone(),
        background: dataset.background,
        global,
        cross_section,
        normalized,
        event_weight_ratio,
        warnings,
    }
}

/// The luminosity-normalized number of events before any cut, or `None` when
/// cut flows stay in raw weights.
fn luminosity_initial(
    dataset: &DatasetSample,
    yields: &DatasetYield,
    config: &AnalysisConfiguration,
) -> Option<Measurement> {
    match config.normalize() {
        NormalizeType::None => None,
        NormalizeType::LumiWeight => Some(yields.normalized),
        NormalizeType::Lumi if dataset.has_xsection_override() => Some(yields.normalized),
        NormalizeType::Lumi => Some(scale_to_luminosity(
            yields.global.xsection,
            yields.global.xerror,
            1.0,
            config.lumi(),
        )),
    }
}

fn normalize_region(
    session: &AnalysisSession,
    index: usize,
    dataset: &DatasetSample,
    yields: &DatasetYield,
    region: &str,
    config: &AnalysisConfiguration,
) -> RegionFlow {
    let expected = session.cuts_in_region(region).count();
    let counts = session
        .cutflows
        .get(index)
        .and_then(|flow| flow.region(region));

    let mut warnings = Vec::new();
    let (start, cuts): (WeightedCount, &[CutCounts]) = match counts {
        Some(counts) => (counts.initial, counts.cuts.as_slice()),
        None => (WeightedCount::default(), &[]),
    };
    if counts.is_none() || cuts.len() != expected {
        warnings.push(AggregationWarning::MismatchedCutFlow {
            dataset: dataset.name.clone(),
            region: region.to_string(),
            expected,
            found: cuts.len(),
        });
    }

    let initial = luminosity_initial(dataset, yields, config)
        .unwrap_or_else(|| Measurement::exact(start.net()));

    let entries = (0..expected)
        .map(|position| {
            let counts = cuts.get(position).copied().unwrap_or_default();
            cut_entry(initial, start, counts)
        })
        .collect();

    RegionFlow {
        region: region.to_string(),
        initial,
        initial_entries: start.nentries,
        entries,
        warnings,
    }
}

fn cut_entry(initial: Measurement, start: WeightedCount, counts: CutCounts) -> CutFlowEntry {
    let mut warnings = Vec::new();
    let n0 = start.net();

    let (selected, rejected) =
        match checked_ratio(counts.selected.net(), n0, RatioKind::CutFraction, &mut warnings) {
            Some(kept) => (
                scaled_fraction(initial, kept, start.nentries),
                scaled_fraction(initial, counts.rejected.net() / n0, start.nentries),
            ),
            None => (Measurement::zero(), Measurement::zero()),
        };

    let nentries = counts.selected.nentries + counts.rejected.nentries;
    with_efficiencies(initial, start.nentries, selected, rejected, nentries, warnings)
}

fn with_efficiencies(
    initial: Measurement,
    initial_entries: u64,
    selected: Measurement,
    rejected: Measurement,
    nentries: u64,
    mut warnings: Vec<AggregationWarning>,
) -> CutFlowEntry {
    let eff = efficiency(
        selected.mean,
        selected.mean + rejected.mean,
        nentries,
        RatioKind::Efficiency,
        &mut warnings,
    );
    let cumulative = efficiency(
        selected.mean,
        initial.mean,
        initial_entries,
        RatioKind::CumulativeEfficiency,
        &mut warnings,
    );
    CutFlowEntry {
        selected,
        rejected,
        efficiency: eff,
        cumulative_efficiency: cumulative,
        nentries,
        warnings,
    }
}

/// Sums the flows of every dataset of one class, region by region.
fn combine_class(
    session: &AnalysisSession,
    flows: &[Vec<RegionFlow>],
    nregions: usize,
    background: bool,
) -> Vec<RegionFlow> {
    (0..nregions)
        .map(|r| {
            let members: Vec<&RegionFlow> = session
                .datasets
                .iter()
                .zip(flows)
                .filter(|(dataset, _)| dataset.background == background)
                .map(|(_, per_region)| &per_region[r])
                .collect();
            combine_flows(&members)
        })
        .collect()
}

fn combine_flows(members: &[&RegionFlow]) -> RegionFlow {
    let Some(first) = members.first() else {
        return RegionFlow::default();
    };

    let initial = members
        .iter()
        .fold(Measurement::zero(), |acc, f| acc.add_uncorrelated(&f.initial));
    let initial_entries = members.iter().map(|f| f.initial_entries).sum();

    let entries = (0..first.entries.len())
        .map(|position| {
            let mut selected = Measurement::zero();
            let mut rejected = Measurement::zero();
            let mut nentries = 0;
            for entry in members.iter().filter_map(|f| f.entries.get(position)) {
                selected = selected.add_uncorrelated(&entry.selected);
                rejected = rejected.add_uncorrelated(&entry.rejected);
                nentries += entry.nentries;
            }
            with_efficiencies(initial, initial_entries, selected, rejected, nentries, Vec::new())
        })
        .collect();

    RegionFlow {
        region: first.region.clone(),
        initial,
        initial_entries,
        entries,
        warnings: Vec::new(),
    }
}
