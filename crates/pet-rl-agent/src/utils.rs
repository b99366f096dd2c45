//! Schedules and running statistics used by the learning engine

use serde::{Deserialize, Serialize};

/// A value that moves one notch per learning step
pub trait Schedule: Send + Sync {
    /// Current value
    fn current(&self) -> f64;

    /// Move one step and return the new value
    fn advance(&mut self) -> f64;

    /// Jump to an explicit value, e.g. when restoring a snapshot
    fn reset_to(&mut self, value: f64);
}

/// Multiplicative decay toward a floor; never increases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExponentialDecay {
    value: f64,
    /// Multiplier applied every step
    pub decay: f64,
    /// Lower bound
    pub floor: f64,
}

impl ExponentialDecay {
    /// Create a new decay starting at `start`
    #[must_use]
    pub fn new(start: f64, decay: f64, floor: f64) -> Self {
        Self {
            value: start.max(floor),
            decay: decay.clamp(0.0, 1.0),
            floor,
        }
    }
}

impl Schedule for ExponentialDecay {
    fn current(&self) -> f64 {
        self.value
    }

    fn advance(&mut self) -> f64 {
        self.value = (self.value * self.decay).max(self.floor);
        self.value
    }

    fn reset_to(&mut self, value: f64) {
        self.value = value.max(self.floor);
    }
}

/// Additive ramp toward a ceiling; never decreases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRamp {
    value: f64,
    /// Amount added every step
    pub increment: f64,
    /// Upper bound
    pub ceiling: f64,
}

impl LinearRamp {
    /// Create a new ramp starting at `start`
    #[must_use]
    pub fn new(start: f64, increment: f64, ceiling: f64) -> Self {
        Self {
            value: start.min(ceiling),
            increment: increment.max(0.0),
            ceiling,
        }
    }
}

impl Schedule for LinearRamp {
    fn current(&self) -> f64 {
        self.value
    }

    fn advance(&mut self) -> f64 {
        self.value = (self.value + self.increment).min(self.ceiling);
        self.value
    }

    fn reset_to(&mut self, value: f64) {
        self.value = value.min(self.ceiling);
    }
}

/// Running total and mean of observed rewards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningReward {
    /// Sum of all rewards
    pub total: f64,
    /// Number of rewards seen
    pub count: u64,
}

impl RunningReward {
    /// Record a reward
    pub fn update(&mut self, reward: f64) {
        self.total += reward;
        self.count += 1;
    }

    /// Mean reward, 0 before the first update
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exponential_decay_hits_floor() {
        let mut schedule = ExponentialDecay::new(1.0, 0.5, 0.1);
        assert_relative_eq!(schedule.advance(), 0.5);
        assert_relative_eq!(schedule.advance(), 0.25);
        assert_relative_eq!(schedule.advance(), 0.125);
        assert_relative_eq!(schedule.advance(), 0.1);
        assert_relative_eq!(schedule.advance(), 0.1);

        schedule.reset_to(0.01);
        assert_relative_eq!(schedule.current(), 0.1);
    }

    #[test]
    fn test_linear_ramp_caps() {
        let mut schedule = LinearRamp::new(0.4, 0.25, 1.0);
        assert_relative_eq!(schedule.advance(), 0.65);
        assert_relative_eq!(schedule.advance(), 0.9);
        assert_relative_eq!(schedule.advance(), 1.0);
        assert_relative_eq!(schedule.advance(), 1.0);
    }

    #[test]
    fn test_running_reward() {
        let mut running = RunningReward::default();
        assert_relative_eq!(running.mean(), 0.0);
        running.update(2.0);
        running.update(-1.0);
        assert_relative_eq!(running.total, 1.0);
        assert_relative_eq!(running.mean(), 0.5);
    }
}
