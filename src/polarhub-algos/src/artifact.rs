//! Artifact detection and correction for RR interval series.
//!
//! Implements the dRR-shape classifier of Lipponen & Tarvainen (2019).
//! Detection thresholds adapt to local variability through rolling quartile
//! deviations of the successive-difference series, and suspect beats are
//! classified by where they land in the (dRR, s12) and (dRR, s22) subspaces
//! before being corrected.

use std::fmt;

const ALPHA: f64 = 5.2;
const MIN_THRESHOLD_MS: f64 = 50.0;
// 91-point centered threshold window, 11-point centered median window.
const THRESHOLD_HALF_WINDOW: usize = 45;
const MEDIAN_HALF_WINDOW: usize = 5;
const C1: f64 = 0.13;
const C2: f64 = 0.17;

/// Below this many intervals the classifier has no context and passes the
/// series through unchanged.
pub const MIN_SERIES_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactType {
    None,
    Ectopic,
    Missed,
    MissedInserted,
    Extra,
    ExtraAbsorbed,
    LongShort,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::None => "none",
            ArtifactType::Ectopic => "ectopic",
            ArtifactType::Missed => "missed",
            ArtifactType::MissedInserted => "missed_inserted",
            ArtifactType::Extra => "extra",
            ArtifactType::ExtraAbsorbed => "extra_absorbed",
            ArtifactType::LongShort => "longshort",
        }
    }

    /// True for labels that mark a distorted interval. `missed_inserted`
    /// is excluded: the synthetic half-beat is a correction product, not an
    /// artifact occurrence of its own.
    pub fn is_artifact(&self) -> bool {
        !matches!(self, ArtifactType::None | ArtifactType::MissedInserted)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatClass {
    /// Corrected interval in milliseconds; `None` for beats absorbed into
    /// their predecessor.
    pub rr_clean: Option<f64>,
    pub artifact: ArtifactType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RrAnalysis {
    /// One entry per input interval.
    pub results: Vec<BeatClass>,
    /// Correction-adjusted series suitable for HRV: missed beats contribute
    /// their split interval twice, absorbed beats contribute nothing.
    pub clean_series: Vec<f64>,
}

/// Classify and correct a series of RR intervals (milliseconds).
///
/// Pure: identical input yields identical output, independent of prior
/// calls.
pub fn analyze_rr(rr: &[f64]) -> RrAnalysis {
    let n = rr.len();
    if n < MIN_SERIES_LEN {
        return RrAnalysis {
            results: rr
                .iter()
                .map(|&v| BeatClass {
                    rr_clean: Some(v),
                    artifact: ArtifactType::None,
                })
                .collect(),
            clean_series: rr.to_vec(),
        };
    }

    let mut drr = vec![0.0; n];
    for i in 1..n {
        drr[i] = rr[i] - rr[i - 1];
    }
    // The first difference does not exist; fill with the mean of the rest
    // so the edge windows are not biased by a zero.
    drr[0] = drr[1..].iter().sum::<f64>() / (n - 1) as f64;

    let th1: Vec<f64> = (0..n).map(|i| adaptive_threshold(&drr, i)).collect();

    let med_rr: Vec<f64> = (0..n)
        .map(|i| {
            let (lo, hi) = window_bounds(n, i, MEDIAN_HALF_WINDOW);
            median(&rr[lo..hi])
        })
        .collect();

    // Deviation from the local median, doubled when short: a too-short
    // interval is half as far from the median as the missing half it
    // implies.
    let mrr: Vec<f64> = rr
        .iter()
        .zip(&med_rr)
        .map(|(&v, &m)| {
            let d = v - m;
            if d < 0.0 {
                2.0 * d
            } else {
                d
            }
        })
        .collect();
    let th2: Vec<f64> = (0..n).map(|i| adaptive_threshold(&mrr, i)).collect();

    let drrs: Vec<f64> = drr.iter().zip(&th1).map(|(&d, &t)| d / t).collect();
    let mrrs: Vec<f64> = mrr.iter().zip(&th2).map(|(&m, &t)| m / t).collect();

    let s12: Vec<f64> = (0..n)
        .map(|i| {
            let prev = at(&drrs, i as isize - 1);
            let next = at(&drrs, i as isize + 1);
            if drrs[i] > 0.0 {
                prev.max(next)
            } else if drrs[i] < 0.0 {
                prev.min(next)
            } else {
                0.0
            }
        })
        .collect();
    let s22: Vec<f64> = (0..n)
        .map(|i| {
            let a = at(&drrs, i as isize + 1);
            let b = at(&drrs, i as isize + 2);
            if drrs[i] >= 0.0 {
                a.min(b)
            } else {
                a.max(b)
            }
        })
        .collect();

    let mut artifacts = vec![ArtifactType::None; n];
    let mut ectopic_pairs: Vec<(usize, usize)> = Vec::new();

    let mut i = 0;
    while i + 2 < n {
        if drrs[i].abs() <= 1.0 {
            i += 1;
            continue;
        }

        let ectopic_short_long = drrs[i] > 1.0 && s12[i] < -C1 * drrs[i] - C2;
        let ectopic_long_short = drrs[i] < -1.0 && s12[i] > -C1 * drrs[i] + C2;
        if ectopic_short_long || ectopic_long_short {
            if i > 0 {
                // The sharp reversal implicates this interval and its
                // predecessor as the two halves of the ectopic pair.
                ectopic_pairs.push((i - 1, i));
                i += 2;
            } else {
                // No predecessor to pair with.
                artifacts[0] = ArtifactType::LongShort;
                i += 1;
            }
            continue;
        }

        if drrs[i].abs() > 1.0 || mrrs[i].abs() > 3.0 {
            let mut candidates = vec![i];
            if at(&drrs, i as isize + 1).abs() < at(&drrs, i as isize + 2).abs() {
                candidates.push(i + 1);
            }

            let mut advanced = None;
            for &j in &candidates {
                let extra = drrs[j] < -1.0
                    && s22[j] > 1.0
                    && (rr[j] + rr[j + 1] - med_rr[j]).abs() < th2[j];
                if extra {
                    artifacts[j] = ArtifactType::Extra;
                    artifacts[j + 1] = ArtifactType::ExtraAbsorbed;
                    advanced = Some(j + 2);
                    break;
                }

                let missed = drrs[j] > 1.0
                    && s22[j] < -1.0
                    && (rr[j] / 2.0 - med_rr[j]).abs() < th2[j];
                if missed {
                    artifacts[j] = ArtifactType::Missed;
                    advanced = Some(j + 2);
                    break;
                }
            }

            match advanced {
                Some(next) => i = next,
                None => {
                    artifacts[i] = ArtifactType::LongShort;
                    i += 1;
                }
            }
            continue;
        }

        i += 1;
    }

    let mut results: Vec<BeatClass> = (0..n)
        .map(|i| match artifacts[i] {
            ArtifactType::Missed => BeatClass {
                rr_clean: Some(rr[i] / 2.0),
                artifact: ArtifactType::Missed,
            },
            ArtifactType::Extra => BeatClass {
                rr_clean: Some(rr[i] + rr[i + 1]),
                artifact: ArtifactType::Extra,
            },
            ArtifactType::ExtraAbsorbed => BeatClass {
                rr_clean: None,
                artifact: ArtifactType::ExtraAbsorbed,
            },
            ArtifactType::LongShort => BeatClass {
                rr_clean: Some(med_rr[i]),
                artifact: ArtifactType::LongShort,
            },
            _ => BeatClass {
                rr_clean: Some(rr[i]),
                artifact: ArtifactType::None,
            },
        })
        .collect();

    // Ectopic pairs win over any long/short decision already taken at the
    // same indices.
    for &(a, b) in &ectopic_pairs {
        let fixed = (rr[a] + rr[b]) / 2.0;
        results[a] = BeatClass {
            rr_clean: Some(fixed),
            artifact: ArtifactType::Ectopic,
        };
        results[b] = BeatClass {
            rr_clean: Some(fixed),
            artifact: ArtifactType::Ectopic,
        };
    }

    let mut clean_series = Vec::with_capacity(n + 1);
    for r in &results {
        match (r.artifact, r.rr_clean) {
            (ArtifactType::ExtraAbsorbed, _) => {}
            (ArtifactType::Missed, Some(v)) => {
                clean_series.push(v);
                clean_series.push(v);
            }
            (_, Some(v)) => clean_series.push(v),
            (_, None) => {}
        }
    }

    RrAnalysis {
        results,
        clean_series,
    }
}

fn window_bounds(n: usize, i: usize, half: usize) -> (usize, usize) {
    // Centered window that shrinks at the edges rather than wrapping.
    (i.saturating_sub(half), (i + half + 1).min(n))
}

fn adaptive_threshold(series: &[f64], i: usize) -> f64 {
    let (lo, hi) = window_bounds(series.len(), i, THRESHOLD_HALF_WINDOW);
    let mut window = series[lo..hi].to_vec();
    window.sort_by(|a, b| a.total_cmp(b));
    let qd = (quantile_sorted(&window, 0.75) - quantile_sorted(&window, 0.25)) / 2.0;
    (ALPHA * qd).max(MIN_THRESHOLD_MS)
}

/// Midpoint quantile: average the two straddling order statistics when the
/// rank is fractional.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        (sorted[lo] + sorted[hi]) / 2.0
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, 0.5)
}

/// Series lookup with out-of-range indices reading as zero.
fn at(values: &[f64], i: isize) -> f64 {
    if i < 0 || i as usize >= values.len() {
        0.0
    } else {
        values[i as usize]
    }
}
