//! Reduces a finished monitor interval to a scalar performance score.
//! 将一个完成的监测区间归约为一个标量性能分数。

use crate::config::UtilityConfig;
use crate::monitor::MonitorInterval;

/// A pluggable utility function.
///
/// The formula is a design choice, not a contract, but its operands are:
/// the observed sending rate rewards throughput, while RTT inflation and
/// loss — both scaled by the sending rate — penalize queueing and waste.
///
/// 可插拔的效用函数。
///
/// 公式是设计选择而非契约，但其操作数是：观测到的发送速率奖励吞吐量，
/// 而RTT膨胀和丢包（两者都按发送速率缩放）惩罚排队和浪费。
pub trait UtilityFunction: Send {
    fn utility(&self, interval: &MonitorInterval) -> f64;
}

/// The default throughput-biased utility:
///
/// `alpha * rate_mbps^exponent - c1 * rate_mbps * rtt_inflation - c2 * rate_mbps * loss_rate`
///
/// 默认的偏向吞吐量的效用函数。
#[derive(Debug, Clone)]
pub struct VivaceUtility {
    config: UtilityConfig,
}

impl VivaceUtility {
    pub fn new(config: UtilityConfig) -> Self {
        Self { config }
    }
}

impl UtilityFunction for VivaceUtility {
    fn utility(&self, interval: &MonitorInterval) -> f64 {
        let rate_mbps = interval.send_rate() * 1e-6;
        let rate_term = self.config.alpha * rate_mbps.powf(self.config.exponent);
        let rtt_term =
            self.config.rtt_inflation_coefficient * interval.rtt_inflation() * rate_mbps;
        let loss_term = self.config.loss_coefficient * interval.loss_rate() * rate_mbps;
        rate_term - rtt_term - loss_term
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::Rate;
    use std::time::{Duration, Instant};

    const PACKET: u64 = 1000;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// A window with `acked` of 10 packets acknowledged at constant RTT and
    /// the rest lost.
    fn window(acked: u64) -> MonitorInterval {
        let base = Instant::now();
        let mut mi = MonitorInterval::new(0, Rate::from_kbps(512), base + ms(1000));
        for i in 0..10u64 {
            mi.on_packet_sent(base + ms(i * 100), i + 1, PACKET);
        }
        for i in 0..acked {
            mi.on_packet_acked(base + ms(i * 100 + 50), i + 1, PACKET, ms(50));
        }
        for i in acked..10 {
            mi.on_packet_lost(base + ms(i * 100 + 80), i + 1, PACKET);
        }
        mi
    }

    #[test]
    fn test_empty_interval_scores_zero() {
        let utility = VivaceUtility::new(UtilityConfig::default());
        let mi = MonitorInterval::new(0, Rate::from_kbps(512), Instant::now());
        assert_eq!(utility.utility(&mi), 0.0);
    }

    #[test]
    fn test_clean_window_scores_the_rate_term() {
        let utility = VivaceUtility::new(UtilityConfig::default());
        let mi = window(10);
        // No loss, no inflation: utility is exactly alpha * rate^exponent.
        let rate_mbps = mi.send_rate() * 1e-6;
        let expected = rate_mbps.powf(0.9);
        assert!((utility.utility(&mi) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_loss_lowers_utility() {
        let utility = VivaceUtility::new(UtilityConfig::default());
        let clean = utility.utility(&window(10));
        let lossy = utility.utility(&window(5));
        assert!(lossy < clean);
    }

    #[test]
    fn test_inflation_lowers_utility() {
        let utility = VivaceUtility::new(UtilityConfig::default());
        let base = Instant::now();
        let mut inflated = MonitorInterval::new(0, Rate::from_kbps(512), base + ms(1000));
        for i in 0..10u64 {
            inflated.on_packet_sent(base + ms(i * 100), i + 1, PACKET);
        }
        for i in 0..10u64 {
            inflated.on_packet_acked(base + ms(i * 100 + 50), i + 1, PACKET, ms(50 + i * 20));
        }
        let flat = utility.utility(&window(10));
        assert!(utility.utility(&inflated) < flat);
    }
}
