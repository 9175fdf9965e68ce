//! The agent-driven strategy: rate decisions delegated to an external
//! decision process over the observation/action/reward protocol.
//!
//! 代理驱动策略：通过观测/动作/奖励协议将速率决策委托给外部决策过程。

use crate::agent::{Action, AgentDriver, ObservationWindow, StepSnapshot};
use crate::config::{AgentConfig, ControllerConfig};
use crate::monitor::MonitorInterval;
use crate::rate::Rate;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Drives the episodic step protocol.
///
/// Each finished interval becomes one step: its derived ratios are pushed
/// into the observation window, a reward is computed, and a snapshot is
/// posted to the agent. The next rate decision applies the most recent
/// action received; until one arrives (or if the agent is gone for good)
/// the previous rate stays in effect.
///
/// 驱动回合式步进协议。
///
/// 每个完成的区间成为一步：其派生比率被推入观测窗口，计算一个奖励，
/// 并向代理投递一个快照。下一次速率决策应用收到的最新动作；
/// 在动作到达之前（或代理永久离开时），前一速率保持生效。
#[derive(Debug)]
pub struct AgentRateController {
    driver: AgentDriver,
    config: AgentConfig,
    min_rate: Rate,
    max_rate: Rate,

    window: ObservationWindow,
    /// The lowest nonzero average latency observed on this connection.
    /// Connection-scoped on purpose: a process-wide floor would let
    /// concurrent connections contaminate each other's latency ratios.
    /// 此连接上观测到的最低非零平均延迟。刻意按连接划分：进程级的下限
    /// 会让并发连接互相污染彼此的延迟比。
    min_latency: Option<Duration>,
    last_reward: f64,
    step: u32,
    /// Set once the agent endpoint is gone; we hold the last rate from then on.
    /// 一旦代理端点消失即置位；此后我们保持最后的速率。
    disconnected: bool,
}

impl AgentRateController {
    pub fn new(controller: &ControllerConfig, agent: &AgentConfig, driver: AgentDriver) -> Self {
        Self {
            driver,
            window: ObservationWindow::new(agent.history_len),
            config: agent.clone(),
            min_rate: controller.min_rate,
            max_rate: controller.max_rate,
            min_latency: None,
            last_reward: 0.0,
            step: 0,
            disconnected: false,
        }
    }

    pub fn interval_finished(&mut self, interval: &MonitorInterval) {
        let latency = interval.avg_rtt();
        if latency > Duration::ZERO {
            self.min_latency = Some(match self.min_latency {
                Some(floor) => floor.min(latency),
                None => latency,
            });
        }

        let latency_ratio = match self.min_latency {
            Some(floor) if latency > Duration::ZERO => {
                latency.as_secs_f64() / floor.as_secs_f64()
            }
            _ => 1.0,
        };
        self.window.push(
            interval.send_ratio(),
            latency_ratio,
            interval.sent_latency_inflation(),
        );

        self.last_reward = self.reward_for(interval);
        self.step += 1;
        let episode_done = self.step >= self.config.episode_length;
        trace!(
            id = interval.id(),
            step = self.step,
            reward = self.last_reward,
            episode_done,
            "agent step"
        );

        let snapshot = StepSnapshot {
            observation: self.window.to_vec(),
            reward: self.last_reward,
            episode_done,
            extra_info: format!("step={} reward={:.4}", self.step, self.last_reward),
        };
        if episode_done {
            // Only the per-episode counter resets; history, latency floor
            // and rate state carry over into the next episode.
            self.step = 0;
            debug!("agent episode finished");
        }

        if !self.disconnected && self.driver.try_request(snapshot).is_err() {
            warn!("agent disconnected, holding last known rate");
            self.disconnected = true;
        }
    }

    pub fn next_rate(&mut self, current: Rate) -> Rate {
        if self.disconnected {
            return current;
        }
        match self.driver.try_take_action() {
            Ok(Some(action)) => self.apply_action(current, action),
            Ok(None) => current,
            Err(_) => {
                warn!("agent disconnected, holding last known rate");
                self.disconnected = true;
                current
            }
        }
    }

    /// Applies one bounded scalar action to the current rate.
    /// 将一个有界标量动作应用于当前速率。
    fn apply_action(&self, current: Rate, Action(raw): Action) -> Rate {
        let action = raw.clamp(self.config.action_low, self.config.action_high);
        if action != raw {
            warn!(raw, action, "agent action out of bounds, clamped");
        }
        let scaled = self.config.rate_adjust_scale * action;
        let next = if action >= 0.0 {
            current.mul_f64(1.0 + scaled)
        } else {
            current.div_f64(1.0 - scaled)
        };
        next.clamp(self.min_rate, self.max_rate)
    }

    fn reward_for(&self, interval: &MonitorInterval) -> f64 {
        let throughput = interval.throughput();
        if throughput == 0.0 {
            // Sending nothing must never look optimal.
            return self.config.zero_throughput_reward;
        }
        let latency_over_base =
            interval.avg_rtt().as_secs_f64() / self.config.base_rtt.as_secs_f64();
        let latency_penalty = self.config.latency_weight
            * (latency_over_base - self.config.latency_penalty_threshold).max(0.0);
        let loss_penalty = self.config.loss_weight
            * (interval.loss_ratio() - self.config.loss_threshold).max(0.0);
        self.config.reward_scale
            * (throughput / self.config.mean_bandwidth_bps - latency_penalty - loss_penalty)
    }

    /// The reward computed for the most recently finished interval.
    /// 为最近完成的区间计算的奖励。
    pub fn last_reward(&self) -> f64 {
        self.last_reward
    }

    pub fn reset(&mut self) {
        self.step = 0;
    }
}
