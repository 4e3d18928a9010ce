use serde::Serialize;

use crate::game_log::{GameRecord, Location, Metric};
use crate::team_results::Outcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricMean {
    pub metric: Metric,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAverages {
    pub label: String,
    pub games: usize,
    pub means: Vec<MetricMean>,
}

impl GroupAverages {
    pub fn mean_of(&self, metric: Metric) -> Option<f64> {
        self.means
            .iter()
            .find(|m| m.metric == metric)
            .and_then(|m| m.mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Split {
    pub groups: Vec<GroupAverages>,
}

impl Split {
    pub fn group(&self, label: &str) -> Option<&GroupAverages> {
        self.groups.iter().find(|g| g.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub metrics: Vec<Metric>,
    /// Row-major, `metrics.len()` squared. None where undefined.
    pub values: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Metric, b: Metric) -> Option<f64> {
        let i = self.metrics.iter().position(|m| *m == a)?;
        let j = self.metrics.iter().position(|m| *m == b)?;
        self.values[i * self.metrics.len() + j]
    }
}

/// Mean of the finite values; None when nothing is left.
pub fn mean(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.into_iter().flatten() {
        if v.is_finite() {
            sum += v;
            n += 1;
        }
    }
    if n == 0 { None } else { Some(sum / n as f64) }
}

pub fn metric_means(records: &[GameRecord], metrics: &[Metric]) -> Vec<MetricMean> {
    metrics
        .iter()
        .map(|m| MetricMean {
            metric: *m,
            mean: mean(records.iter().map(|r| r.stat(*m))),
        })
        .collect()
}

pub fn shooting_summary(records: &[GameRecord]) -> Vec<MetricMean> {
    metric_means(records, &Metric::SHOOTING)
}

pub fn location_split(records: &[GameRecord], metrics: &[Metric]) -> Split {
    let groups = [Location::Home, Location::Away]
        .into_iter()
        .map(|loc| {
            let rows = records
                .iter()
                .filter(|r| r.location == loc)
                .cloned()
                .collect::<Vec<_>>();
            group(loc.label(), &rows, metrics)
        })
        .collect();
    Split { groups }
}

/// Win/loss averages. Games without a known outcome are left out.
pub fn outcome_split(records: &[GameRecord], metrics: &[Metric]) -> Split {
    let groups = [Outcome::Win, Outcome::Loss]
        .into_iter()
        .map(|outcome| {
            let rows = records
                .iter()
                .filter(|r| r.outcome == Some(outcome))
                .cloned()
                .collect::<Vec<_>>();
            group(outcome.label(), &rows, metrics)
        })
        .collect();
    Split { groups }
}

fn group(label: &str, rows: &[GameRecord], metrics: &[Metric]) -> GroupAverages {
    GroupAverages {
        label: label.to_string(),
        games: rows.len(),
        means: metric_means(rows, metrics),
    }
}

/// Trailing mean over `window` games. A slot is None until the first full
/// window and whenever the window holds a missing (NaN) value.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            if slice.iter().any(|v| !v.is_finite()) {
                return None;
            }
            Some(slice.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Pearson correlation over the games where both metrics are present.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

pub fn correlation_matrix(records: &[GameRecord], metrics: &[Metric]) -> CorrelationMatrix {
    let mut values = Vec::with_capacity(metrics.len() * metrics.len());
    for a in metrics {
        for b in metrics {
            let pairs = records
                .iter()
                .filter_map(|r| Some((r.stat(*a)?, r.stat(*b)?)))
                .collect::<Vec<_>>();
            values.push(pearson(&pairs));
        }
    }
    CorrelationMatrix {
        metrics: metrics.to_vec(),
        values,
    }
}
