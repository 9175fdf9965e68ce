//! Monitor intervals: fixed bandwidth-probing windows and their queue.
//!
//! A monitor interval holds one target sending rate for a fixed span of
//! time and accounts every packet sent into it until each one is known to
//! be acknowledged or lost. The queue routes per-packet events to the
//! interval(s) they belong to and surfaces intervals whose accounting is
//! complete, oldest first.
//!
//! 监测区间：固定的带宽探测窗口及其队列。
//!
//! 一个监测区间在固定的时间跨度内保持一个目标发送速率，并对发入其中的
//! 每个包进行记账，直到每个包都已知被确认或丢失。队列将逐包事件路由到
//! 它们所属的区间，并按从旧到新的顺序给出记账完成的区间。

pub mod interval;
pub mod queue;

pub use interval::{MonitorInterval, PacketRttSample};
pub use queue::MonitorIntervalQueue;
