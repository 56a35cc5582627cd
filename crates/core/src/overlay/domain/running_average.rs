use crate::shared::constants::SAMPLE_COUNT_CEILING;

/// Incremental mean of per-frame fetch latency, in seconds.
///
/// Keeps only the sample count and the current mean. Once the count reaches
/// [`SAMPLE_COUNT_CEILING`] the next sample restarts the mean from scratch
/// instead of growing the weight further.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningAverage {
    count: u64,
    average_secs: f64,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_state(count: u64, average_secs: f64) -> Self {
        Self {
            count,
            average_secs,
        }
    }

    /// Folds one latency sample into the mean.
    pub fn fold(&mut self, elapsed_secs: f64) {
        if self.count >= SAMPLE_COUNT_CEILING {
            self.count = 0;
        }
        let elapsed = elapsed_secs.max(0.0);
        let weight = self.count as f64;
        self.average_secs = (elapsed + self.average_secs * weight) / (weight + 1.0);
        self.count += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn average_secs(&self) -> f64 {
        self.average_secs
    }

    /// Frames per second implied by the mean latency, or `None` while the
    /// mean is zero.
    pub fn fps(&self) -> Option<f64> {
        if self.average_secs > 0.0 {
            Some(1.0 / self.average_secs)
        } else {
            None
        }
    }
}
