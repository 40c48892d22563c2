//! Running Statistics

/// Running arithmetic mean with an optional seed used until the first value arrives
#[derive(Debug, Clone, Default)]
pub struct RunningMean {
    /// Sum of recorded values
    sum: f64,
    /// Number of recorded values
    count: usize,
    /// Value reported while nothing has been recorded
    seed: f64,
}

impl RunningMean {
    /// Create a running mean reporting `seed` until the first value is recorded
    pub fn seeded(seed: f64) -> Self {
        Self {
            sum: 0.0,
            count: 0,
            seed,
        }
    }

    /// Fold a value in
    pub fn record(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Current mean (the seed when empty)
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            self.seed
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Drop recorded values and install a new seed
    pub fn reset(&mut self, seed: f64) {
        *self = Self::seeded(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_until_first_value() {
        let mut mean = RunningMean::seeded(10.0);
        assert_eq!(mean.mean(), 10.0);
        assert_eq!(mean.count(), 0);

        mean.record(4.0);
        assert_eq!(mean.mean(), 4.0);

        mean.record(6.0);
        assert_eq!(mean.mean(), 5.0);
        assert_eq!(mean.count(), 2);
    }

    #[test]
    fn test_reset() {
        let mut mean = RunningMean::seeded(1.0);
        mean.record(100.0);
        mean.reset(2.0);
        assert_eq!(mean.mean(), 2.0);
        assert_eq!(mean.count(), 0);
    }
}
