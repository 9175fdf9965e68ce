//! Pluggable rate-decision strategies.
//!
//! The engine consumes one finished monitor interval at a time and asks the
//! controller for the next target sending rate. The set of strategies is
//! closed: a controller for a new connection is built fresh from
//! configuration, never cloned from a live one.
//!
//! 可插拔的速率决策策略。
//!
//! 引擎每次消费一个完成的监测区间，并向控制器询问下一个目标发送速率。
//! 策略集合是封闭的：新连接的控制器从配置全新构建，而不是从活动控制器克隆。

use crate::agent::AgentDriver;
use crate::config::{AgentConfig, ControllerConfig};
use crate::monitor::MonitorInterval;
use crate::rate::Rate;

pub mod agent;
pub mod fixed;
pub mod perturbation;

pub use agent::AgentRateController;
pub use fixed::FixedRate;
pub use perturbation::RandomPerturbation;


/// The closed set of rate-decision strategies.
/// 速率决策策略的封闭集合。
#[derive(Debug)]
pub enum RateController {
    /// A constant configured rate.
    /// 恒定的配置速率。
    Fixed(FixedRate),
    /// Random multiplicative perturbation of the previous rate.
    /// 对前一速率的随机乘性扰动。
    Perturbation(RandomPerturbation),
    /// Decisions delegated to an external agent over the step protocol.
    /// 通过步进协议委托给外部代理的决策。
    Agent(AgentRateController),
}

impl RateController {
    pub fn fixed(config: &ControllerConfig) -> Self {
        Self::Fixed(FixedRate::new(config))
    }

    pub fn perturbation(config: &ControllerConfig) -> Self {
        Self::Perturbation(RandomPerturbation::new(config))
    }

    pub fn agent(
        controller: &ControllerConfig,
        agent: &AgentConfig,
        driver: AgentDriver,
    ) -> Self {
        Self::Agent(AgentRateController::new(controller, agent, driver))
    }

    /// Consumes one finalized interval, in creation order. Called exactly
    /// once per interval, never concurrently with event accounting.
    /// 按创建顺序消费一个定稿的区间。每个区间恰好调用一次，
    /// 绝不与事件记账并发。
    pub fn interval_finished(&mut self, interval: &MonitorInterval) {
        match self {
            Self::Fixed(s) => s.interval_finished(interval),
            Self::Perturbation(s) => s.interval_finished(interval),
            Self::Agent(s) => s.interval_finished(interval),
        }
    }

    /// Decides the next target sending rate given the current one.
    /// 在给定当前速率的情况下决定下一个目标发送速率。
    pub fn next_rate(&mut self, current: Rate) -> Rate {
        match self {
            Self::Fixed(s) => s.next_rate(current),
            Self::Perturbation(s) => s.next_rate(current),
            Self::Agent(s) => s.next_rate(current),
        }
    }

    /// Resets per-episode bookkeeping. Cross-episode state (rates, latency
    /// floors, observation history) is deliberately retained.
    /// 重置回合内簿记。跨回合状态（速率、延迟下限、观测历史）被有意保留。
    pub fn reset(&mut self) {
        match self {
            Self::Fixed(s) => s.reset(),
            Self::Perturbation(s) => s.reset(),
            Self::Agent(s) => s.reset(),
        }
    }
}
