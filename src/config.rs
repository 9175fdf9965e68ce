//! 定义了引擎的可配置参数。
//! Defines configurable parameters for the engine.

use crate::error::{Error, Result};
use crate::rate::Rate;
use std::time::Duration;

/// A structure containing all configurable parameters for one connection's engine.
///
/// 包含单个连接引擎所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// Monitor-interval sizing and pacing parameters.
    /// 监测区间大小和整流相关参数。
    pub monitor: MonitorConfig,

    /// Utility-function parameters.
    /// 效用函数相关参数。
    pub utility: UtilityConfig,

    /// Rate-controller strategy parameters.
    /// 速率控制器策略相关参数。
    pub controller: ControllerConfig,

    /// Agent-driven strategy and reward parameters.
    /// 代理驱动策略和奖励相关参数。
    pub agent: AgentConfig,
}

/// Monitor-interval sizing and pacing parameters.
///
/// 监测区间大小和整流相关参数。
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// The duration of a monitor interval as a fraction of the conservative
    /// RTT estimate.
    /// 监测区间时长占保守RTT估计值的比例。
    pub interval_rtt_fraction: f64,
    /// The minimum number of packets a monitor interval must be able to carry.
    /// At very low rates this term dominates and stretches the interval.
    /// 一个监测区间必须能够承载的最少包数。在极低速率下该项起主导作用并拉长区间。
    pub min_packets_per_interval: u32,
    /// The reference segment size, in bytes, used when sizing an interval.
    /// 计算区间大小时使用的参考段大小（以字节为单位）。
    pub reference_segment_size: u32,
    /// The target sending rate a connection starts with.
    /// 连接启动时的目标发送速率。
    pub initial_rate: Rate,
    /// The factor applied to the target rate when pushing a pacing rate to
    /// the transport.
    /// 向传输层推送整流速率时应用于目标速率的系数。
    pub pacing_gain: f64,
}

/// Utility-function parameters.
///
/// The defaults reproduce the throughput-biased utility with RTT-inflation
/// and loss penalties; every coefficient is a tunable, not a contract.
///
/// 效用函数相关参数。默认值重现了带RTT膨胀和丢包惩罚、偏向吞吐量的效用函数；
/// 每个系数都是可调参数，而不是契约。
#[derive(Debug, Clone)]
pub struct UtilityConfig {
    /// Coefficient of the sending-rate term.
    /// 发送速率项的系数。
    pub alpha: f64,
    /// Exponent applied to the sending rate (in Mbps).
    /// 应用于发送速率（Mbps）的指数。
    pub exponent: f64,
    /// Weight of the RTT-inflation penalty.
    /// RTT膨胀惩罚的权重。
    pub rtt_inflation_coefficient: f64,
    /// Weight of the loss-rate penalty.
    /// 丢包率惩罚的权重。
    pub loss_coefficient: f64,
}

/// Rate-controller strategy parameters.
///
/// 速率控制器策略相关参数。
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// The lowest rate any strategy may decide. Also the floor a degenerate
    /// (zero) computed rate falls back to.
    /// 任何策略可以决定的最低速率。也是退化（零）速率的回退下限。
    pub min_rate: Rate,
    /// The highest rate any strategy may decide.
    /// 任何策略可以决定的最高速率。
    pub max_rate: Rate,
    /// The rate returned by the fixed strategy.
    /// 固定策略返回的速率。
    pub fixed_rate: Rate,
    /// If set, the fixed strategy halves its rate each time this many
    /// intervals have finished. Illustrative policy, off by default.
    /// 如果设置，固定策略在每完成这么多区间后将其速率减半。演示性策略，默认关闭。
    pub halve_after_intervals: Option<u32>,
    /// Bound of the random perturbation: each decision multiplies the rate
    /// by `1 + e` with `e` drawn uniformly from `[-bound, bound]`.
    /// 随机扰动的界：每次决策将速率乘以 `1 + e`，`e` 从 `[-bound, bound]` 均匀抽取。
    pub perturbation_bound: f64,
    /// Optional RNG seed for the perturbation strategy, for reproducible runs.
    /// 扰动策略的可选RNG种子，用于可复现的运行。
    pub perturbation_seed: Option<u64>,
}

/// Agent-driven strategy and reward parameters.
///
/// 代理驱动策略和奖励相关参数。
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Number of observation triples kept in the rolling history.
    /// 滚动历史中保留的观测三元组数量。
    pub history_len: usize,
    /// Number of finished intervals after which an episode ends. The episode
    /// boundary resets the step counter only; cross-episode state persists.
    /// 一个回合在多少个完成的区间后结束。回合边界仅重置步数计数器；跨回合状态持续存在。
    pub episode_length: u32,
    /// Scale applied to the agent's action before adjusting the rate.
    /// 在调整速率之前应用于代理动作的比例。
    pub rate_adjust_scale: f64,
    /// Lower bound of the action space; out-of-range actions are clamped.
    /// 动作空间的下界；超出范围的动作会被钳制。
    pub action_low: f64,
    /// Upper bound of the action space; out-of-range actions are clamped.
    /// 动作空间的上界；超出范围的动作会被钳制。
    pub action_high: f64,
    /// Overall scale of the reward.
    /// 奖励的整体比例。
    pub reward_scale: f64,
    /// Bandwidth the throughput term is normalized against, in bits/second.
    /// 吞吐量项归一化所依据的带宽（比特每秒）。
    pub mean_bandwidth_bps: f64,
    /// Baseline round-trip time the latency penalty is measured against.
    /// 延迟惩罚所参照的基准往返时间。
    pub base_rtt: Duration,
    /// The latency penalty triggers only above this multiple of the baseline RTT.
    /// 延迟惩罚仅在超过基准RTT的此倍数时触发。
    pub latency_penalty_threshold: f64,
    /// Weight of the latency penalty once triggered.
    /// 延迟惩罚触发后的权重。
    pub latency_weight: f64,
    /// The loss penalty triggers only above this loss ratio.
    /// 丢包惩罚仅在丢包率超过此阈值时触发。
    pub loss_threshold: f64,
    /// Weight of the loss penalty once triggered.
    /// 丢包惩罚触发后的权重。
    pub loss_weight: f64,
    /// Reward returned when observed throughput is exactly zero. Forbids the
    /// degenerate "send nothing" optimum.
    /// 观测吞吐量恰好为零时返回的奖励。禁止退化的"什么都不发"最优解。
    pub zero_throughput_reward: f64,
    /// Capacity of the request/response channels on the agent boundary.
    /// 代理边界上请求/响应通道的容量。
    pub channel_capacity: usize,
}

impl Config {
    /// Checks cross-field constraints that the type system cannot express.
    /// 检查类型系统无法表达的跨字段约束。
    pub fn validate(&self) -> Result<()> {
        if self.controller.min_rate > self.controller.max_rate {
            return Err(Error::InvalidConfig("min_rate must not exceed max_rate"));
        }
        if self.controller.min_rate.is_zero() {
            return Err(Error::InvalidConfig("min_rate must be nonzero"));
        }
        if self.monitor.interval_rtt_fraction <= 0.0 {
            return Err(Error::InvalidConfig(
                "interval_rtt_fraction must be positive",
            ));
        }
        if self.monitor.min_packets_per_interval == 0 {
            return Err(Error::InvalidConfig(
                "min_packets_per_interval must be nonzero",
            ));
        }
        if self.agent.history_len == 0 {
            return Err(Error::InvalidConfig("history_len must be nonzero"));
        }
        if self.agent.episode_length == 0 {
            return Err(Error::InvalidConfig("episode_length must be nonzero"));
        }
        if self.agent.rate_adjust_scale <= 0.0 {
            return Err(Error::InvalidConfig("rate_adjust_scale must be positive"));
        }
        if self.agent.action_low >= self.agent.action_high {
            return Err(Error::InvalidConfig(
                "action_low must be below action_high",
            ));
        }
        if self.agent.channel_capacity == 0 {
            return Err(Error::InvalidConfig("channel_capacity must be nonzero"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            utility: UtilityConfig::default(),
            controller: ControllerConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_rtt_fraction: 0.5,
            min_packets_per_interval: 5,
            reference_segment_size: 1400,
            initial_rate: Rate::from_kbps(512),
            pacing_gain: 1.1,
        }
    }
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            exponent: 0.9,
            rtt_inflation_coefficient: 900.0,
            loss_coefficient: 11.35,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_rate: Rate::from_kbps(512),
            max_rate: Rate::from_mbps(1000),
            fixed_rate: Rate::from_kbps(512),
            halve_after_intervals: None,
            perturbation_bound: 0.05,
            perturbation_seed: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_len: 10,
            episode_length: 400,
            rate_adjust_scale: 1.0,
            action_low: -1.0,
            action_high: 1.0,
            reward_scale: 3_000.0,
            mean_bandwidth_bps: 1_024_000.0,
            base_rtt: Duration::from_millis(62),
            latency_penalty_threshold: 1.5,
            latency_weight: 1.0,
            loss_threshold: 0.05,
            loss_weight: 6.0,
            zero_throughput_reward: -1_000.0,
            channel_capacity: 4,
        }
    }
}
