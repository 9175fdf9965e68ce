//! An ordered queue of in-flight monitor intervals.
//! 在途监测区间的有序队列。

use super::interval::MonitorInterval;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A FIFO of monitor intervals, oldest first.
///
/// Only the most recently pushed interval is "open" and receives sent-packet
/// events. Acks and losses, however, are routed to every interval that is
/// not yet fully accounted for: probing windows started in quick succession
/// overlap, and a single acknowledgment can close out several of them.
///
/// 监测区间的先进先出队列，最旧的在前。
///
/// 只有最近压入的区间是"开放"的并接收发包事件。而确认和丢失会被路由到
/// 每一个尚未完全记账的区间：快速连续开启的探测窗口相互重叠，
/// 一次确认可能同时关闭其中数个。
#[derive(Debug, Default)]
pub struct MonitorIntervalQueue {
    intervals: VecDeque<MonitorInterval>,
}

impl MonitorIntervalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interval; it becomes the open one.
    /// 追加一个区间；它成为开放区间。
    pub fn push(&mut self, interval: MonitorInterval) {
        self.intervals.push_back(interval);
    }

    /// Forwards a send event to the open (newest) interval.
    /// 将发送事件转发给开放（最新）的区间。
    pub fn on_packet_sent(&mut self, now: Instant, seq: u64, size: u64) {
        if let Some(interval) = self.intervals.back_mut() {
            interval.on_packet_sent(now, seq, size);
        }
    }

    /// Forwards an ack to every interval still missing outcomes.
    /// 将确认转发给每个仍缺少结果的区间。
    pub fn on_packet_acked(&mut self, now: Instant, seq: u64, size: u64, rtt: Duration) {
        for interval in &mut self.intervals {
            if interval.all_packets_accounted_for(now) {
                // Skip intervals whose utility input is already complete.
                continue;
            }
            interval.on_packet_acked(now, seq, size, rtt);
        }
    }

    /// Forwards a loss to every interval still missing outcomes.
    /// 将丢失转发给每个仍缺少结果的区间。
    pub fn on_packet_lost(&mut self, now: Instant, seq: u64, size: u64) {
        for interval in &mut self.intervals {
            if interval.all_packets_accounted_for(now) {
                continue;
            }
            interval.on_packet_lost(now, seq, size);
        }
    }

    /// True iff the oldest interval is fully accounted for. Intervals are
    /// finalized strictly in creation order, even when several are ready.
    /// 当且仅当最旧的区间已完全记账时为真。即使多个区间同时就绪，
    /// 区间也严格按创建顺序定稿。
    pub fn has_finished_interval(&self, now: Instant) -> bool {
        match self.intervals.front() {
            Some(interval) => interval.all_packets_accounted_for(now),
            None => false,
        }
    }

    /// Removes and returns the oldest interval.
    /// 移除并返回最旧的区间。
    pub fn pop(&mut self) -> Option<MonitorInterval> {
        self.intervals.pop_front()
    }

    /// The open (newest) interval, if any.
    /// 开放（最新）的区间，如果存在。
    pub fn current(&self) -> Option<&MonitorInterval> {
        self.intervals.back()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Drops all intervals, e.g. on connection teardown.
    /// 丢弃所有区间，例如在连接拆除时。
    pub fn clear(&mut self) {
        self.intervals.clear();
    }
}
