//! The randomized-perturbation strategy.
//! 随机扰动策略。

use crate::config::ControllerConfig;
use crate::monitor::MonitorInterval;
use crate::rate::Rate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// Multiplies the previous rate by `1 + e`, with `e` drawn uniformly from
/// `[-bound, bound]`, and clamps the result to the configured rate range.
///
/// 将前一速率乘以 `1 + e`（`e` 从 `[-bound, bound]` 均匀抽取），
/// 并将结果钳制在配置的速率范围内。
#[derive(Debug)]
pub struct RandomPerturbation {
    rng: StdRng,
    bound: f64,
    min_rate: Rate,
    max_rate: Rate,
}

impl RandomPerturbation {
    pub fn new(config: &ControllerConfig) -> Self {
        let rng = match config.perturbation_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            bound: config.perturbation_bound,
            min_rate: config.min_rate,
            max_rate: config.max_rate,
        }
    }

    pub fn interval_finished(&mut self, interval: &MonitorInterval) {
        trace!(
            id = interval.id(),
            utility = interval.utility(),
            "perturbation interval finished"
        );
    }

    pub fn next_rate(&mut self, current: Rate) -> Rate {
        let epsilon = if self.bound > 0.0 {
            self.rng.random_range(-self.bound..=self.bound)
        } else {
            0.0
        };
        let next = current
            .mul_f64(1.0 + epsilon)
            .clamp(self.min_rate, self.max_rate);
        trace!(epsilon, rate = %next, "perturbed rate");
        next
    }

    pub fn reset(&mut self) {}
}
