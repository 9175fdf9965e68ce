//! The fixed-rate strategy.
//! 固定速率策略。

use crate::config::ControllerConfig;
use crate::monitor::MonitorInterval;
use crate::rate::Rate;
use tracing::debug;

/// Returns a constant configured rate, optionally halved each time a fixed
/// number of intervals has finished. The halving is an illustrative policy
/// for exercising the control loop, not a congestion response.
///
/// 返回恒定的配置速率，可选地在每完成固定数量的区间后减半。
/// 减半是用于演练控制回路的演示性策略，而不是拥塞响应。
#[derive(Debug)]
pub struct FixedRate {
    rate: Rate,
    min_rate: Rate,
    halve_after: Option<u32>,
    finished_intervals: u32,
}

impl FixedRate {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            rate: config.fixed_rate,
            min_rate: config.min_rate,
            halve_after: config.halve_after_intervals,
            finished_intervals: 0,
        }
    }

    pub fn interval_finished(&mut self, interval: &MonitorInterval) {
        self.finished_intervals += 1;
        debug!(
            id = interval.id(),
            utility = interval.utility(),
            finished = self.finished_intervals,
            "fixed-rate interval finished"
        );
    }

    pub fn next_rate(&mut self, _current: Rate) -> Rate {
        if let Some(period) = self.halve_after {
            if self.finished_intervals >= period {
                self.finished_intervals = 0;
                self.rate = self.rate.halved().clamp(self.min_rate, self.rate);
                debug!(rate = %self.rate, "fixed rate halved");
            }
        }
        self.rate
    }

    pub fn reset(&mut self) {
        self.finished_intervals = 0;
    }
}
