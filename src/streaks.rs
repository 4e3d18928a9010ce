use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreakConfig {
    pub threshold: f64,
    pub min_length: usize,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            threshold: 20.0,
            min_length: 3,
        }
    }
}

/// Inclusive, 0-based index range into the scanned sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub start: usize,
    pub end: usize,
}

impl Streak {
    pub fn games(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start && idx <= self.end
    }
}

/// Maximal runs of `values[i] >= threshold` lasting at least `min_length` games.
///
/// Values are expected in chronological order. NaN never qualifies, so a
/// missing game breaks a run.
pub fn detect_streaks(values: &[f64], cfg: StreakConfig) -> Vec<Streak> {
    let min_length = cfg.min_length.max(1);
    let mut out = Vec::new();
    let mut run = 0usize;

    for (i, value) in values.iter().enumerate() {
        if *value >= cfg.threshold {
            run += 1;
            continue;
        }
        if run >= min_length {
            out.push(Streak {
                start: i - run,
                end: i - 1,
            });
        }
        run = 0;
    }

    if run >= min_length {
        out.push(Streak {
            start: values.len() - run,
            end: values.len() - 1,
        });
    }

    out
}

pub fn longest_streak(streaks: &[Streak]) -> Option<Streak> {
    // Earliest wins a tie.
    streaks
        .iter()
        .copied()
        .reduce(|best, s| if s.games() > best.games() { s } else { best })
}
