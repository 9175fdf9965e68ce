//! An estimator for the round-trip time (RTT).
//! RTT 估算器。

use std::time::Duration;

const ALPHA: f64 = 1.0 / 8.0;
const BETA: f64 = 1.0 / 4.0;

/// An exponentially-smoothed estimator of the round-trip time and its
/// variation, in the Jacobson/Karels style.
///
/// The conservative estimate (`mean + 4 * variance`) is what sizes monitor
/// intervals: it errs toward overestimation so a window does not close
/// before its acknowledgments could plausibly arrive.
///
/// 一个 Jacobson/Karels 风格的、对往返时间及其变化量进行指数平滑的估算器。
/// 保守估计值（`mean + 4 * variance`）用于确定监测区间的大小：
/// 它偏向高估，使窗口不会在其确认可能到达之前关闭。
#[derive(Debug, Clone, Default)]
pub struct RttEstimator {
    /// The smoothed round-trip time, in seconds.
    /// 平滑的往返时间（秒）。
    srtt: f64,
    /// The round-trip time variation, in seconds.
    /// 往返时间变化量（秒）。
    rttvar: f64,
}

impl RttEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether at least one sample has been absorbed.
    /// 是否已吸收至少一个样本。
    pub fn is_seeded(&self) -> bool {
        self.srtt != 0.0
    }

    /// Updates the estimator with a new sample.
    ///
    /// The first sample seeds the mean and half of it seeds the variation;
    /// subsequent samples are folded in with the usual exponential weights.
    /// Note the variation is computed against the freshly updated mean.
    ///
    /// 使用一个新的样本更新估算器。
    /// 第一个样本作为均值的种子，其一半作为变化量的种子；
    /// 后续样本以常规的指数权重折算。注意变化量是针对刚更新的均值计算的。
    pub fn add_sample(&mut self, rtt: Duration) {
        let sample = rtt.as_secs_f64();
        if self.srtt == 0.0 {
            self.srtt = sample;
            self.rttvar = sample / 2.0;
        } else {
            self.srtt = (1.0 - ALPHA) * self.srtt + ALPHA * sample;
            self.rttvar = (1.0 - BETA) * self.rttvar + BETA * (self.srtt - sample).abs();
        }
    }

    /// The smoothed mean RTT.
    /// 平滑的RTT均值。
    pub fn smoothed(&self) -> Duration {
        Duration::from_secs_f64(self.srtt)
    }

    /// The smoothed RTT variation.
    /// 平滑的RTT变化量。
    pub fn variation(&self) -> Duration {
        Duration::from_secs_f64(self.rttvar)
    }

    /// A worst-case estimate: `mean + 4 * variation`.
    /// 最坏情况估计值：`mean + 4 * variation`。
    pub fn conservative(&self) -> Duration {
        Duration::from_secs_f64(self.srtt + 4.0 * self.rttvar)
    }
}
