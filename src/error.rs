//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the congestion-control engine.
/// 拥塞控制引擎的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// The decision agent's endpoint was dropped and no further actions
    /// can ever arrive. The control loop is expected to hold the last
    /// known rate when it observes this.
    ///
    /// 决策代理的端点已被丢弃，不会再有任何动作到达。
    /// 控制回路在观察到此错误时应保持最后已知的速率。
    #[error("decision agent disconnected")]
    AgentDisconnected,

    /// An internal channel for communication between tasks was closed unexpectedly.
    /// 用于任务间通信的内部通道意外关闭。
    #[error("internal channel is broken")]
    ChannelClosed,

    /// A configuration value is out of its permitted range.
    /// 配置值超出了允许的范围。
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
