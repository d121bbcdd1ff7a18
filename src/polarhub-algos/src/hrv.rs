/// Time-domain HRV metrics over a cleaned RR series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HrvMetrics {
    /// Mean RR interval in milliseconds.
    pub mean_rr: f64,
    /// Root mean square of successive differences.
    pub rmssd: f64,
    /// Sample standard deviation of the intervals.
    pub sdnn: f64,
    /// Percentage of successive differences exceeding 50 ms.
    pub pnn50: f64,
}

impl HrvMetrics {
    /// Computes metrics from RR intervals (milliseconds). Needs at least
    /// two intervals to form a successive difference.
    pub fn from_rr(intervals: &[f64]) -> Option<Self> {
        if intervals.len() < 2 {
            return None;
        }

        let n = intervals.len() as f64;
        let mean_rr = intervals.iter().sum::<f64>() / n;

        let variance = intervals
            .iter()
            .map(|&rr| (rr - mean_rr).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        let sdnn = variance.sqrt();

        let mut sum_sq_diff = 0.0;
        let mut over_50 = 0usize;
        for window in intervals.windows(2) {
            let diff = (window[1] - window[0]).abs();
            sum_sq_diff += diff * diff;
            if diff > 50.0 {
                over_50 += 1;
            }
        }

        let rmssd = (sum_sq_diff / (n - 1.0)).sqrt();
        let pnn50 = over_50 as f64 / (n - 1.0) * 100.0;

        Some(Self {
            mean_rr,
            rmssd,
            sdnn,
            pnn50,
        })
    }

    pub fn heart_rate_bpm(&self) -> f64 {
        60_000.0 / self.mean_rr
    }

    /// Degenerate input (zeros, NaN from upstream) must not reach the
    /// dashboard; callers drop the tick instead.
    pub fn is_finite(&self) -> bool {
        self.mean_rr.is_finite()
            && self.rmssd.is_finite()
            && self.sdnn.is_finite()
            && self.pnn50.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_two_intervals() {
        assert!(HrvMetrics::from_rr(&[]).is_none());
        assert!(HrvMetrics::from_rr(&[800.0]).is_none());
    }

    #[test]
    fn constant_series_has_zero_variability() {
        let hrv = HrvMetrics::from_rr(&[750.0; 20]).unwrap();
        assert_eq!(hrv.mean_rr, 750.0);
        assert_eq!(hrv.rmssd, 0.0);
        assert_eq!(hrv.sdnn, 0.0);
        assert_eq!(hrv.pnn50, 0.0);
    }

    #[test]
    fn alternating_series_rmssd() {
        // Alternating 800/900: every successive difference is 100, so
        // RMSSD = 100 and every difference clears the 50 ms bar.
        let rr: Vec<f64> = (0..10)
            .map(|i| if i % 2 == 0 { 800.0 } else { 900.0 })
            .collect();
        let hrv = HrvMetrics::from_rr(&rr).unwrap();
        assert!((hrv.rmssd - 100.0).abs() < 1e-9);
        assert_eq!(hrv.pnn50, 100.0);
    }

    #[test]
    fn typical_resting_series() {
        let rr = [780.0, 820.0, 810.0, 790.0, 830.0, 800.0, 815.0, 785.0];
        let hrv = HrvMetrics::from_rr(&rr).unwrap();
        assert!((hrv.mean_rr - 803.75).abs() < 1.0);
        assert!(hrv.sdnn > 0.0);
        assert!(hrv.rmssd > 0.0);
        assert!((0.0..=100.0).contains(&hrv.pnn50));
    }

    #[test]
    fn pnn50_counts_strict_exceedances() {
        // Differences: 50 (not counted), 51 (counted).
        let rr = [800.0, 850.0, 901.0];
        let hrv = HrvMetrics::from_rr(&rr).unwrap();
        assert_eq!(hrv.pnn50, 50.0);
    }

    #[test]
    fn heart_rate_from_mean() {
        let hrv = HrvMetrics::from_rr(&[857.0, 857.0]).unwrap();
        assert!((hrv.heart_rate_bpm() - 70.0).abs() < 0.1);
    }

    #[test]
    fn finite_check_rejects_nan() {
        let hrv = HrvMetrics {
            mean_rr: f64::NAN,
            rmssd: 1.0,
            sdnn: 1.0,
            pnn50: 0.0,
        };
        assert!(!hrv.is_finite());
    }
}
