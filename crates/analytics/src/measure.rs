//! Pure numeric building blocks of the statistical account.

use crate::error::{AggregationWarning, RatioKind};
use core_types::{DatasetSample, MeasuredSample, Measurement};

/// Combines the per-file measurements of a dataset.
///
/// Event counts and weight sums add up. The cross section is the mean of the
/// file cross sections weighted by their event counts; the errors are combined
/// in quadrature with the same weights.
pub fn aggregate_dataset(samples: &[MeasuredSample]) -> MeasuredSample {
    let mut total = MeasuredSample::default();
    let mut weighted_xsection = 0.0;
    let mut weighted_xerror_sq = 0.0;

    for sample in samples {
        let n = sample.nevents as f64;
        total.nevents += sample.nevents;
        total.sumw_positive += sample.sumw_positive;
        total.sumw_negative += sample.sumw_negative;
        weighted_xsection += sample.xsection * n;
        weighted_xerror_sq += (sample.xerror * n).powi(2);
    }

    if total.nevents > 0 {
        let n = total.nevents as f64;
        total.xsection = weighted_xsection / n;
        total.xerror = weighted_xerror_sq.sqrt() / n;
    }
    total
}

/// The cross section reported for a dataset, in pb.
///
/// A user-imposed cross section is exact and is not multiplied by the weight.
pub fn dataset_cross_section(dataset: &DatasetSample, global: &MeasuredSample) -> Measurement {
    if dataset.has_xsection_override() {
        Measurement::exact(dataset.xsection)
    } else {
        Measurement::new(
            global.xsection * dataset.weight,
            global.xerror * dataset.weight,
        )
    }
}

/// Expected number of events for `lumi` fb^-1 of a `xsection` pb process.
///
/// The mean is truncated to an integer, the error rounded up.
pub fn scale_to_luminosity(xsection: f64, xerror: f64, weight: f64, lumi: f64) -> Measurement {
    let mean = (xsection * 1000.0 * lumi * weight).trunc();
    let error = (xerror * 1000.0 * lumi * weight).ceil();
    Measurement::new(mean, error)
}

/// `numerator / denominator`, or 0 with a warning when the denominator is not
/// strictly positive.
pub(crate) fn checked_ratio(
    numerator: f64,
    denominator: f64,
    ratio: RatioKind,
    warnings: &mut Vec<AggregationWarning>,
) -> Option<f64> {
    if denominator == 0.0 {
        warnings.push(AggregationWarning::ZeroDenominator { ratio });
        None
    } else if denominator < 0.0 {
        warnings.push(AggregationWarning::NegativeDenominator { ratio, denominator });
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Binomial uncertainty of a fraction `p` measured on `entries` entries.
/// `|p(1-p)|` keeps the error real when negative weights push `p` out of [0,1].
pub(crate) fn binomial_error(p: f64, entries: u64) -> f64 {
    if entries == 0 {
        0.0
    } else {
        ((p * (1.0 - p)).abs() / entries as f64).sqrt()
    }
}

/// The share `p` of `base`, with `p` measured on `entries` raw entries.
///
/// The error combines the uncertainty on `base` with the binomial fluctuation
/// of the fraction.
pub(crate) fn scaled_fraction(base: Measurement, p: f64, entries: u64) -> Measurement {
    let error = (base.error * p).hypot(base.mean * binomial_error(p, entries));
    Measurement::new(base.mean * p, error)
}

/// An efficiency with its binomial error, flagged when it leaves [0,1].
pub(crate) fn efficiency(
    numerator: f64,
    denominator: f64,
    entries: u64,
    ratio: RatioKind,
    warnings: &mut Vec<AggregationWarning>,
) -> Measurement {
    let Some(value) = checked_ratio(numerator, denominator, ratio, warnings) else {
        return Measurement::zero();
    };
    if !(0.0..=1.0).contains(&value) {
        warnings.push(AggregationWarning::EfficiencyOutOfRange { ratio, value });
    }
    Measurement::new(value, binomial_error(value, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(nevents: u64, xsection: f64, xerror: f64) -> MeasuredSample {
        MeasuredSample {
            nevents,
            xsection,
            xerror,
            sumw_positive: nevents as f64,
            sumw_negative: 0.0,
        }
    }

    #[test]
    fn aggregation_weights_cross_sections_by_event_count() {
        let total = aggregate_dataset(&[sample(1000, 2.0, 0.3), sample(3000, 4.0, 0.4)]);
        assert_eq!(total.nevents, 4000);
        assert_relative_eq!(total.xsection, 3.5);
        assert_relative_eq!(total.xerror, (300.0f64.powi(2) + 1200.0f64.powi(2)).sqrt() / 4000.0);
        assert_relative_eq!(total.sumw_positive, 4000.0);
    }

    #[test]
    fn aggregation_of_nothing_is_zero() {
        assert_eq!(aggregate_dataset(&[]), MeasuredSample::default());
    }

    #[test]
    fn override_cross_section_is_exact() {
        let mut dataset = DatasetSample::new("ttbar", true);
        dataset.weight = 2.0;
        let global = sample(100, 5.0, 0.5);

        assert_eq!(dataset_cross_section(&dataset, &global), Measurement::new(10.0, 1.0));
        dataset.xsection = 1.5;
        assert_eq!(dataset_cross_section(&dataset, &global), Measurement::exact(1.5));
    }

    #[test]
    fn luminosity_scaling_truncates_mean_and_rounds_error_up() {
        let yields = scale_to_luminosity(2.0, 0.01, 1.0, 10.0);
        assert_eq!(yields.mean, 20000.0);
        assert_eq!(yields.error, 100.0);

        let yields = scale_to_luminosity(1.23456, 0.000101, 0.5, 1.0);
        assert_eq!(yields.mean, 617.0);
        assert_eq!(yields.error, 1.0);
    }

    #[test]
    fn zero_and_negative_denominators_warn() {
        let mut warnings = Vec::new();
        let eff = efficiency(3.0, 0.0, 10, RatioKind::Efficiency, &mut warnings);
        assert_eq!(eff, Measurement::zero());
        let eff = efficiency(3.0, -1.0, 10, RatioKind::Efficiency, &mut warnings);
        assert_eq!(eff, Measurement::zero());
        assert_eq!(
            warnings,
            vec![
                AggregationWarning::ZeroDenominator {
                    ratio: RatioKind::Efficiency
                },
                AggregationWarning::NegativeDenominator {
                    ratio: RatioKind::Efficiency,
                    denominator: -1.0
                },
            ]
        );
    }

    #[test]
    fn efficiency_outside_unit_interval_warns() {
        let mut warnings = Vec::new();
        let eff = efficiency(6.0, 4.0, 10, RatioKind::CumulativeEfficiency, &mut warnings);
        assert_relative_eq!(eff.mean, 1.5);
        assert!(eff.error > 0.0);
        assert!(matches!(
            warnings.as_slice(),
            [AggregationWarning::EfficiencyOutOfRange { value, .. }] if *value == 1.5
        ));
    }

    #[test]
    fn binomial_error_of_a_plain_efficiency() {
        let mut warnings = Vec::new();
        let eff = efficiency(25.0, 100.0, 100, RatioKind::Efficiency, &mut warnings);
        assert!(warnings.is_empty());
        assert_relative_eq!(eff.mean, 0.25);
        assert_relative_eq!(eff.error, (0.25f64 * 0.75 / 100.0).sqrt());
    }

    #[test]
    fn scaled_fraction_propagates_both_uncertainties() {
        let kept = scaled_fraction(Measurement::new(1000.0, 10.0), 0.5, 100);
        assert_relative_eq!(kept.mean, 500.0);
        assert_relative_eq!(
            kept.error,
            (5.0f64.powi(2) + 50.0f64.powi(2)).sqrt(),
            epsilon = 1e-9
        );
    }
}
