//! A single bandwidth-probing window and its per-packet accounting.
//! 单个带宽探测窗口及其逐包记账。

use crate::rate::Rate;
use std::time::{Duration, Instant};
use tracing::trace;

/// One RTT measurement attributed to a sequence number.
/// 归属于某个序列号的一次RTT测量。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRttSample {
    pub seq: u64,
    pub rtt: Duration,
}

/// A monitor interval: one probing window at a fixed target sending rate.
///
/// The interval accumulates sent/acked/lost byte and packet counts and
/// per-packet RTT samples. Once every sent packet's outcome is known and
/// the scheduled end time has passed, the interval is complete and a
/// utility score may be attached to it, exactly once.
///
/// 监测区间：一个以固定目标发送速率运行的探测窗口。
///
/// 区间累积已发送/已确认/已丢失的字节和包计数以及逐包RTT样本。
/// 一旦每个已发送包的结果都已知且计划的结束时间已过，区间即告完成，
/// 并且可以且仅可以一次性地为其附加一个效用分数。
#[derive(Debug, Clone)]
pub struct MonitorInterval {
    id: u64,

    /// The rate this window probes.
    /// 此窗口探测的速率。
    target_rate: Rate,
    /// The scheduled end of this window; sends after this time belong to
    /// the next interval.
    /// 此窗口的计划结束时间；之后的发送属于下一个区间。
    end_time: Instant,

    first_sent_time: Option<Instant>,
    last_sent_time: Option<Instant>,
    first_ack_time: Option<Instant>,
    last_ack_time: Option<Instant>,

    /// Sequence numbers of the first and last packets sent into this window.
    /// Meaningful only once `packets_sent > 0`.
    /// 发入此窗口的第一个和最后一个包的序列号。仅当 `packets_sent > 0` 时有意义。
    first_seq: u64,
    last_seq: u64,
    /// The highest sequence number whose outcome (acked or lost) is known.
    /// `None` until the first outcome arrives.
    /// 结果（确认或丢失）已知的最高序列号。在第一个结果到达之前为 `None`。
    accounted_through: Option<u64>,

    bytes_sent: u64,
    bytes_acked: u64,
    bytes_lost: u64,
    packets_sent: u64,
    packets_accounted: u64,

    rtt_samples: Vec<PacketRttSample>,

    /// Set exactly once, after the interval is fully accounted for.
    /// 在区间完全记账后恰好设置一次。
    utility: Option<f64>,
}

impl MonitorInterval {
    pub fn new(id: u64, target_rate: Rate, end_time: Instant) -> Self {
        Self {
            id,
            target_rate,
            end_time,
            first_sent_time: None,
            last_sent_time: None,
            first_ack_time: None,
            last_ack_time: None,
            first_seq: 0,
            last_seq: 0,
            accounted_through: None,
            bytes_sent: 0,
            bytes_acked: 0,
            bytes_lost: 0,
            packets_sent: 0,
            packets_accounted: 0,
            rtt_samples: Vec::new(),
            utility: None,
        }
    }

    /// Records a packet sent into this window.
    /// 记录发入此窗口的一个包。
    pub fn on_packet_sent(&mut self, now: Instant, seq: u64, size: u64) {
        if self.packets_sent == 0 {
            self.first_sent_time = Some(now);
            self.first_seq = seq;
            trace!(id = self.id, seq, rate = %self.target_rate, "monitor interval opened");
        }
        self.last_sent_time = Some(now);
        self.last_seq = seq;
        self.packets_sent += 1;
        self.bytes_sent += size;
    }

    /// Records an acknowledgment.
    ///
    /// An ack inside the window accounts for itself plus every sequence
    /// number it skips over (those belong to other windows or were resolved
    /// elsewhere). An ack beyond the window's last sent sequence resolves
    /// the whole window. Replayed acks change nothing.
    ///
    /// 记录一次确认。
    ///
    /// 窗口内的确认为其自身以及它跳过的每个序列号记账（这些序列号属于其他
    /// 窗口或已在别处解决）。超出窗口最后发送序列号的确认会解决整个窗口。
    /// 重放的确认不改变任何状态。
    pub fn on_packet_acked(&mut self, now: Instant, seq: u64, size: u64, rtt: Duration) {
        if self.packets_sent == 0 {
            return;
        }
        if self.contains(seq) {
            if !self.already_accounted(seq) {
                let skipped = match self.accounted_through {
                    None => seq - self.first_seq,
                    Some(through) => seq - through - 1,
                };
                self.bytes_acked += size;
                self.packets_accounted =
                    (self.packets_accounted + skipped + 1).min(self.packets_sent);
                self.rtt_samples.push(PacketRttSample { seq, rtt });
                self.accounted_through = Some(seq);
                self.last_ack_time = Some(now);
            }
        } else if seq > self.last_seq {
            // The peer has moved past this window entirely.
            self.packets_accounted = self.packets_sent;
            self.accounted_through = Some(self.last_seq);
        }
        self.stamp_ack_times(now, seq);
    }

    /// Records a loss. Symmetric to [`Self::on_packet_acked`] but counts the
    /// bytes as lost and takes no RTT sample.
    ///
    /// 记录一次丢失。与 [`Self::on_packet_acked`] 对称，但将字节计为丢失
    /// 并且不采集RTT样本。
    pub fn on_packet_lost(&mut self, now: Instant, seq: u64, size: u64) {
        if self.packets_sent == 0 {
            return;
        }
        if self.contains(seq) {
            if !self.already_accounted(seq) {
                let skipped = match self.accounted_through {
                    None => seq - self.first_seq,
                    Some(through) => seq - through - 1,
                };
                self.bytes_lost += size;
                self.packets_accounted =
                    (self.packets_accounted + skipped + 1).min(self.packets_sent);
                self.accounted_through = Some(seq);
            }
        } else if seq > self.last_seq {
            self.packets_accounted = self.packets_sent;
            self.accounted_through = Some(self.last_seq);
        }
        self.stamp_ack_times(now, seq);
    }

    /// First/last receive-window timestamps are stamped the first time an
    /// outcome reaches or passes the window's first/last sent sequence, and
    /// never overwritten by replays.
    /// 首次有结果到达或越过窗口的第一个/最后一个发送序列号时，盖上接收窗口
    /// 的起止时间戳，重放不会覆盖。
    fn stamp_ack_times(&mut self, now: Instant, seq: u64) {
        if seq >= self.first_seq && self.first_ack_time.is_none() {
            self.first_ack_time = Some(now);
        }
        if seq >= self.last_seq && self.last_ack_time.is_none() {
            self.last_ack_time = Some(now);
        }
    }

    fn contains(&self, seq: u64) -> bool {
        self.packets_sent > 0 && seq >= self.first_seq && seq <= self.last_seq
    }

    fn already_accounted(&self, seq: u64) -> bool {
        matches!(self.accounted_through, Some(through) if seq <= through)
    }

    /// Whether the window's sending phase is over.
    /// 窗口的发送阶段是否已结束。
    pub fn all_packets_sent(&self, now: Instant) -> bool {
        now >= self.end_time
    }

    /// Whether the sending phase is over and every sent packet's outcome is
    /// known. Only then is the interval's performance measurable.
    /// 发送阶段是否已结束且每个已发送包的结果都已知。只有此时区间的性能才可测量。
    pub fn all_packets_accounted_for(&self, now: Instant) -> bool {
        self.all_packets_sent(now) && self.packets_accounted == self.packets_sent
    }

    /// Attaches the utility score. A second call is ignored; the score is
    /// immutable once set.
    /// 附加效用分数。第二次调用会被忽略；分数一经设置即不可变。
    pub fn set_utility(&mut self, utility: f64) {
        if self.utility.is_some() {
            trace!(id = self.id, "utility already set, ignoring");
            return;
        }
        self.utility = Some(utility);
    }

    pub fn utility(&self) -> Option<f64> {
        self.utility
    }

    // --- derived statistics ---
    // Every quotient below defines 0 as its value on an empty denominator.
    // 以下每个商在分母为空时都定义为0。

    /// Span between the first and last send in this window.
    /// 此窗口中第一次和最后一次发送之间的跨度。
    pub fn send_duration(&self) -> Duration {
        match (self.first_sent_time, self.last_sent_time) {
            (Some(first), Some(last)) => last.saturating_duration_since(first),
            _ => Duration::ZERO,
        }
    }

    /// Span between the first and last outcome stamped for this window.
    /// 此窗口中第一个和最后一个结果时间戳之间的跨度。
    pub fn recv_duration(&self) -> Duration {
        match (self.first_ack_time, self.last_ack_time) {
            (Some(first), Some(last)) => last.saturating_duration_since(first),
            _ => Duration::ZERO,
        }
    }

    /// Observed goodput in bits/second: acknowledged bytes over the receive span.
    /// 观测到的有效吞吐量（比特每秒）：确认字节数除以接收跨度。
    pub fn throughput(&self) -> f64 {
        let dur = self.recv_duration().as_secs_f64();
        if dur == 0.0 {
            return 0.0;
        }
        8.0 * self.bytes_acked as f64 / dur
    }

    /// Observed sending rate in bits/second: sent bytes over the send span.
    /// 观测到的发送速率（比特每秒）：发送字节数除以发送跨度。
    pub fn send_rate(&self) -> f64 {
        let dur = self.send_duration().as_secs_f64();
        if dur == 0.0 {
            return 0.0;
        }
        8.0 * self.bytes_sent as f64 / dur
    }

    /// Mean of the RTT samples taken in this window.
    /// 此窗口中采集的RTT样本的均值。
    pub fn avg_rtt(&self) -> Duration {
        if self.rtt_samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: f64 = self.rtt_samples.iter().map(|s| s.rtt.as_secs_f64()).sum();
        Duration::from_secs_f64(sum / self.rtt_samples.len() as f64)
    }

    /// A signed, slope-like indicator of queueing buildup: the difference
    /// between the second-half and first-half average sampled RTTs, per
    /// second of send duration.
    /// 排队累积的带符号斜率型指标：后半段与前半段RTT样本均值之差，
    /// 按每秒发送时长归一。
    pub fn rtt_inflation(&self) -> f64 {
        if self.rtt_samples.len() < 2 {
            return 0.0;
        }
        let send_dur = self.send_duration().as_secs_f64();
        if send_dur == 0.0 {
            return 0.0;
        }
        let half = self.rtt_samples.len() / 2;
        let first_half: f64 = self.rtt_samples[..half]
            .iter()
            .map(|s| s.rtt.as_secs_f64())
            .sum();
        let second_half: f64 = self.rtt_samples[half..2 * half]
            .iter()
            .map(|s| s.rtt.as_secs_f64())
            .sum();
        (second_half - first_half) / (half as f64 * send_dur)
    }

    /// Fraction of sent bytes never acknowledged: `1 - acked / sent`.
    /// 从未被确认的发送字节比例：`1 - acked / sent`。
    pub fn loss_rate(&self) -> f64 {
        if self.bytes_sent == 0 {
            return 0.0;
        }
        1.0 - self.bytes_acked as f64 / self.bytes_sent as f64
    }

    /// Loss ratio over resolved bytes only: `lost / (lost + acked)`.
    /// 仅针对已解决字节的丢包率：`lost / (lost + acked)`。
    pub fn loss_ratio(&self) -> f64 {
        let resolved = self.bytes_lost + self.bytes_acked;
        if resolved == 0 {
            return 0.0;
        }
        self.bytes_lost as f64 / resolved as f64
    }

    /// Absolute latency growth over the window, in seconds.
    /// 窗口内延迟的绝对增长量（秒）。
    pub fn latency_increase(&self) -> f64 {
        self.rtt_inflation() * self.recv_duration().as_secs_f64()
    }

    /// Latency growth normalized by the send duration.
    /// 按发送时长归一的延迟增长量。
    pub fn sent_latency_inflation(&self) -> f64 {
        let dur = self.send_duration().as_secs_f64();
        if dur == 0.0 {
            return 0.0;
        }
        self.latency_increase() / dur
    }

    /// Ratio of send rate to observed throughput, capped at 1.0 from above:
    /// values below 1.0 indicate the path delivered faster than we sent.
    /// 发送速率与观测吞吐量之比，上限为1.0：低于1.0表示路径交付快于发送。
    pub fn send_ratio(&self) -> f64 {
        let throughput = self.throughput();
        let send_rate = self.send_rate();
        if throughput > 0.0 && send_rate < throughput {
            send_rate / throughput
        } else {
            1.0
        }
    }

    pub fn first_ack_latency(&self) -> Duration {
        self.rtt_samples.first().map(|s| s.rtt).unwrap_or_default()
    }

    pub fn last_ack_latency(&self) -> Duration {
        self.rtt_samples.last().map(|s| s.rtt).unwrap_or_default()
    }

    pub fn average_packet_size(&self) -> u64 {
        if self.packets_sent == 0 {
            return 0;
        }
        self.bytes_sent / self.packets_sent
    }

    // --- accessors ---

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn target_rate(&self) -> Rate {
        self.target_rate
    }

    pub fn end_time(&self) -> Instant {
        self.end_time
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn bytes_acked(&self) -> u64 {
        self.bytes_acked
    }

    pub fn bytes_lost(&self) -> u64 {
        self.bytes_lost
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn packets_accounted(&self) -> u64 {
        self.packets_accounted
    }

    pub fn rtt_samples(&self) -> &[PacketRttSample] {
        &self.rtt_samples
    }

    pub fn send_start_time(&self) -> Option<Instant> {
        self.first_sent_time
    }

    pub fn send_end_time(&self) -> Option<Instant> {
        self.last_sent_time
    }

    pub fn recv_start_time(&self) -> Option<Instant> {
        self.first_ack_time
    }

    pub fn recv_end_time(&self) -> Option<Instant> {
        self.last_ack_time
    }
}
