use serde::{Deserialize, Serialize};

/// Share of the distribution treated as the loss tail for VaR and CVaR.
const TAIL: f64 = 0.05;

/// Percentile summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// Distribution of simulated outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub draws: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Percentiles,
    pub probability_positive: f64,
    pub probability_negative: f64,
    /// 5th percentile outcome.
    pub value_at_risk: f64,
    /// Mean of the worst 5% of outcomes.
    pub conditional_value_at_risk: f64,
}

/// Percentile of a **sorted** slice, linearly interpolated between ranks.
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Summarize simulated outcomes; the slice is sorted in place.
///
/// Returns `None` for an empty sample.
pub fn summarize(values: &mut [f64]) -> Option<SimulationSummary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let len = values.len();
    let n = len as f64;

    let mean = values.iter().sum::<f64>() / n;
    let median = if len % 2 == 0 {
        (values[len / 2 - 1] + values[len / 2]) / 2.0
    } else {
        values[len / 2]
    };
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let percentiles = Percentiles {
        p5: percentile_sorted(values, 5.0),
        p10: percentile_sorted(values, 10.0),
        p25: percentile_sorted(values, 25.0),
        p50: percentile_sorted(values, 50.0),
        p75: percentile_sorted(values, 75.0),
        p90: percentile_sorted(values, 90.0),
        p95: percentile_sorted(values, 95.0),
    };

    let tail_len = ((n * TAIL).ceil() as usize).max(1);
    let tail = &values[..tail_len];
    let conditional_value_at_risk = tail.iter().sum::<f64>() / tail_len as f64;

    let positive = values.iter().filter(|v| **v > 0.0).count();
    let negative = values.iter().filter(|v| **v < 0.0).count();

    Some(SimulationSummary {
        draws: len,
        mean,
        median,
        std_dev: variance.sqrt(),
        min: values[0],
        max: values[len - 1],
        value_at_risk: percentiles.p5,
        percentiles,
        probability_positive: positive as f64 / n,
        probability_negative: negative as f64 / n,
        conditional_value_at_risk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sample() {
        assert!(summarize(&mut []).is_none());
    }

    #[test]
    fn test_single_value() {
        let s = summarize(&mut [3.0]).unwrap();
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.percentiles.p95, 3.0);
        assert_eq!(s.conditional_value_at_risk, 3.0);
    }

    #[test]
    fn test_one_to_hundred() {
        let mut values: Vec<f64> = (1..=100).rev().map(f64::from).collect();
        let s = summarize(&mut values).unwrap();
        assert_eq!(s.mean, 50.5);
        assert_eq!(s.median, 50.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 100.0);
        // rank 0.05 * 99 = 4.95 -> 5 + 0.95
        assert!((s.percentiles.p5 - 5.95).abs() < 1e-12);
        assert_eq!(s.value_at_risk, s.percentiles.p5);
        // worst 5: 1..=5
        assert_eq!(s.conditional_value_at_risk, 3.0);
        assert_eq!(s.probability_positive, 1.0);
        assert_eq!(s.probability_negative, 0.0);
    }

    #[test]
    fn test_sign_probabilities_exclude_zero() {
        let s = summarize(&mut [-1.0, 0.0, 1.0, 2.0]).unwrap();
        assert_eq!(s.probability_positive, 0.5);
        assert_eq!(s.probability_negative, 0.25);
    }

    #[test]
    fn test_percentiles_ordered() {
        let mut values: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64).collect();
        let s = summarize(&mut values).unwrap();
        let p = &s.percentiles;
        assert!(p.p5 <= p.p10 && p.p10 <= p.p25 && p.p25 <= p.p50);
        assert!(p.p50 <= p.p75 && p.p75 <= p.p90 && p.p90 <= p.p95);
        assert!(s.conditional_value_at_risk <= s.value_at_risk);
    }
}
