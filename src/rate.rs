//! A data-rate value type used throughout the engine.
//! 贯穿引擎使用的数据速率值类型。

use std::fmt;

/// A sending rate in bits per second.
///
/// All arithmetic is saturating; a rate can never go negative or overflow,
/// so rate math on the packet-event path cannot panic.
///
/// 以比特每秒为单位的发送速率。
/// 所有运算都是饱和的，速率永远不会为负或溢出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rate(u64);

impl Rate {
    pub const ZERO: Rate = Rate(0);

    pub const fn from_bps(bps: u64) -> Self {
        Rate(bps)
    }

    pub const fn from_kbps(kbps: u64) -> Self {
        Rate(kbps * 1_000)
    }

    pub const fn from_mbps(mbps: u64) -> Self {
        Rate(mbps * 1_000_000)
    }

    pub const fn as_bps(self) -> u64 {
        self.0
    }

    /// The rate in decimal megabits per second, as used by the utility formula.
    /// 以十进制兆比特每秒表示的速率，用于效用公式。
    pub fn as_mbps_f64(self) -> f64 {
        self.0 as f64 * 1e-6
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Scales the rate by a factor. Non-finite or negative factors yield zero.
    /// 按系数缩放速率。非有限或负的系数产生零。
    pub fn mul_f64(self, factor: f64) -> Rate {
        if !factor.is_finite() || factor <= 0.0 {
            return Rate::ZERO;
        }
        let scaled = self.0 as f64 * factor;
        if scaled >= u64::MAX as f64 {
            Rate(u64::MAX)
        } else {
            Rate(scaled as u64)
        }
    }

    /// Divides the rate by a divisor. Divisors at or below zero yield zero.
    /// 按除数缩小速率。小于等于零的除数产生零。
    pub fn div_f64(self, divisor: f64) -> Rate {
        if !divisor.is_finite() || divisor <= 0.0 {
            return Rate::ZERO;
        }
        self.mul_f64(1.0 / divisor)
    }

    pub fn clamp(self, min: Rate, max: Rate) -> Rate {
        Rate(self.0.clamp(min.0, max.0))
    }

    pub const fn halved(self) -> Rate {
        Rate(self.0 / 2)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 1_000_000 {
            write!(f, "{:.3}Mbps", self.0 as f64 * 1e-6)
        } else {
            write!(f, "{}bps", self.0)
        }
    }
}
