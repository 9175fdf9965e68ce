//! The observation/action/reward boundary to an external decision agent.
//!
//! The protocol is transport-agnostic: a step snapshot (observation vector,
//! reward, episode-done flag, diagnostic string) flows out, a single bounded
//! scalar action flows back. It can be served in-process by an
//! [`AgentPolicy`] running on a task, or bridged over any transport by
//! holding the [`AgentEndpoint`] on the far side.
//!
//! The driver half never blocks: requests are posted with `try_send` and
//! actions are collected with `try_recv`, so a slow or remote agent can only
//! delay rate changes, never the packet-event timeline.
//!
//! 通往外部决策代理的观测/动作/奖励边界。
//!
//! 协议与传输无关：步进快照（观测向量、奖励、回合结束标志、诊断字符串）
//! 流出，单个有界标量动作流回。它可以由运行在任务上的 [`AgentPolicy`]
//! 在进程内提供服务，也可以通过在远端持有 [`AgentEndpoint`] 跨任意传输桥接。
//!
//! 驱动侧永不阻塞：请求用 `try_send` 投递，动作用 `try_recv` 收集，
//! 因此缓慢或远程的代理只能延迟速率变化，而不能延迟包事件时间线。

use crate::error::{Error, Result};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Number of derived ratios in one observation entry.
/// 一条观测记录中派生比率的数量。
pub const OBSERVATION_TRIPLE: usize = 3;

/// A scalar rate-adjustment action chosen by the agent.
/// 代理选择的标量速率调整动作。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action(pub f64);

/// Everything the agent sees for one step of the episode.
/// 代理在回合的一步中看到的全部内容。
#[derive(Debug, Clone)]
pub struct StepSnapshot {
    /// The rolling observation window, newest entries first, zero-filled
    /// until enough history has accumulated.
    /// 滚动观测窗口，最新的在前，在积累足够历史之前以零填充。
    pub observation: Vec<f32>,
    /// The reward earned by the interval that just finished.
    /// 刚完成的区间所获得的奖励。
    pub reward: f64,
    /// True when this step ends the episode.
    /// 当此步结束回合时为真。
    pub episode_done: bool,
    /// Diagnostic only; carries no protocol meaning.
    /// 仅用于诊断；不承载协议语义。
    pub extra_info: String,
}

/// A fixed-length rolling history of observation triples.
///
/// Each finished interval contributes one triple of
/// (send ratio, latency ratio, sent-latency-inflation); the oldest entries
/// fall off the back.
///
/// 观测三元组的定长滚动历史。
///
/// 每个完成的区间贡献一个（发送比、延迟比、发送延迟膨胀）三元组；
/// 最旧的记录从尾部淘汰。
#[derive(Debug, Clone)]
pub struct ObservationWindow {
    values: VecDeque<f32>,
    capacity: usize,
}

impl ObservationWindow {
    /// `history_len` is counted in triples.
    /// `history_len` 以三元组为单位计数。
    pub fn new(history_len: usize) -> Self {
        let capacity = history_len * OBSERVATION_TRIPLE;
        let mut values = VecDeque::with_capacity(capacity);
        values.resize(capacity, 0.0);
        Self { values, capacity }
    }

    /// Pushes one interval's triple to the front of the history.
    /// 将一个区间的三元组推入历史的前端。
    pub fn push(&mut self, send_ratio: f64, latency_ratio: f64, sent_latency_inflation: f64) {
        self.values.push_front(send_ratio as f32);
        self.values.push_front(latency_ratio as f32);
        self.values.push_front(sent_latency_inflation as f32);
        self.values.truncate(self.capacity);
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.values.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The engine-side half of the boundary.
/// 边界的引擎侧一半。
#[derive(Debug)]
pub struct AgentDriver {
    requests: mpsc::Sender<StepSnapshot>,
    actions: mpsc::Receiver<Action>,
}

/// The agent-side half of the boundary.
/// 边界的代理侧一半。
#[derive(Debug)]
pub struct AgentEndpoint {
    requests: mpsc::Receiver<StepSnapshot>,
    actions: mpsc::Sender<Action>,
}

/// Creates a connected driver/endpoint pair with bounded channels.
/// 创建一对通过有界通道相连的驱动/端点。
pub fn agent_channel(capacity: usize) -> (AgentDriver, AgentEndpoint) {
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (action_tx, action_rx) = mpsc::channel(capacity);
    (
        AgentDriver {
            requests: request_tx,
            actions: action_rx,
        },
        AgentEndpoint {
            requests: request_rx,
            actions: action_tx,
        },
    )
}

impl AgentDriver {
    /// Posts a snapshot without blocking. A full channel drops the snapshot
    /// (the agent is behind; newer snapshots supersede it). A closed channel
    /// means the agent is gone.
    ///
    /// 非阻塞地投递快照。通道已满时丢弃该快照（代理落后了；更新的快照会
    /// 取代它）。通道关闭意味着代理已离开。
    pub fn try_request(&mut self, snapshot: StepSnapshot) -> Result<()> {
        match self.requests.try_send(snapshot) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!("agent request channel full, dropping snapshot");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::AgentDisconnected),
        }
    }

    /// Collects the most recent pending action, if any, without blocking.
    /// Earlier unconsumed actions are discarded: only the newest decision
    /// is meaningful.
    ///
    /// 非阻塞地收集最近一个待处理的动作（如果有）。较早的未消费动作会被
    /// 丢弃：只有最新的决策才有意义。
    pub fn try_take_action(&mut self) -> Result<Option<Action>> {
        let mut latest = None;
        loop {
            match self.actions.try_recv() {
                Ok(action) => latest = Some(action),
                Err(mpsc::error::TryRecvError::Empty) => return Ok(latest),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return if latest.is_some() {
                        Ok(latest)
                    } else {
                        Err(Error::AgentDisconnected)
                    };
                }
            }
        }
    }
}

impl AgentEndpoint {
    /// Waits for the next snapshot from the engine.
    /// 等待来自引擎的下一个快照。
    pub async fn recv(&mut self) -> Result<StepSnapshot> {
        self.requests.recv().await.ok_or(Error::ChannelClosed)
    }

    /// Non-blocking variant of [`Self::recv`], for polling integrations.
    /// [`Self::recv`] 的非阻塞变体，用于轮询式集成。
    pub fn try_recv(&mut self) -> Result<Option<StepSnapshot>> {
        match self.requests.try_recv() {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(Error::ChannelClosed),
        }
    }

    /// Sends an action back to the engine.
    /// 将动作发回引擎。
    pub async fn send_action(&mut self, action: Action) -> Result<()> {
        self.actions
            .send(action)
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// Non-blocking variant of [`Self::send_action`].
    /// [`Self::send_action`] 的非阻塞变体。
    pub fn try_send_action(&mut self, action: Action) -> Result<()> {
        match self.actions.try_send(action) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!("agent action channel full, dropping action");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::ChannelClosed),
        }
    }
}

/// An in-process decision policy.
///
/// Implementations may be arbitrarily slow or perform I/O; the engine only
/// ever talks to them through the channel boundary.
///
/// 进程内决策策略。
///
/// 实现可以任意慢或执行I/O；引擎只通过通道边界与它们交谈。
#[async_trait::async_trait]
pub trait AgentPolicy: Send + 'static {
    async fn act(&mut self, snapshot: StepSnapshot) -> Action;
}

/// Runs a policy against an endpoint on a tokio task: every snapshot is
/// answered with one action until either side hangs up.
///
/// 在tokio任务上针对端点运行一个策略：每个快照都以一个动作应答，
/// 直到任何一侧挂断。
pub fn spawn_policy<P: AgentPolicy>(
    mut policy: P,
    mut endpoint: AgentEndpoint,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        loop {
            let snapshot = match endpoint.recv().await {
                Ok(snapshot) => snapshot,
                // Engine dropped its driver: a normal shutdown.
                Err(Error::ChannelClosed) => return Ok(()),
                Err(e) => return Err(e),
            };
            let action = policy.act(snapshot).await;
            match endpoint.send_action(action).await {
                Ok(()) => {}
                Err(Error::ChannelClosed) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    })
}
