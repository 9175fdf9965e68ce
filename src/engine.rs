//! The per-connection control loop.
//!
//! The loop consumes the connection's packet-event timeline (sends, acks,
//! losses), groups it into monitor intervals, scores each finished interval
//! with the utility function, feeds the score to the rate controller, and
//! pushes the resulting pacing rate to the transport through a [`PacingSink`].
//!
//! 单连接的控制回路。
//!
//! 回路消费连接的包事件时间线（发送、确认、丢失），将其分组为监测区间，
//! 用效用函数为每个完成的区间打分，将分数喂给速率控制器，并通过
//! [`PacingSink`] 将得到的整流速率推送给传输层。

use crate::config::Config;
use crate::controller::RateController;
use crate::error::Result;
use crate::monitor::{MonitorInterval, MonitorIntervalQueue};
use crate::rate::Rate;
use crate::rtt::RttEstimator;
use crate::utility::{UtilityFunction, VivaceUtility};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Where decided pacing rates go. Implemented by the transport integration.
/// 决定的整流速率的去处。由传输层集成实现。
pub trait PacingSink: Send {
    fn apply_pacing_rate(&mut self, rate: Rate);
}

/// The operating state of the control loop.
/// 控制回路的运行状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Probing normally: sends open intervals, finished intervals are scored.
    /// 正常探测：发送会开启区间，完成的区间会被打分。
    Active,
    /// Loss recovery owns the send path. No new intervals are opened and no
    /// interval is finalized until the loop becomes active again.
    /// 丢包恢复接管发送路径。在回路恢复活动之前，不开启新区间也不定稿任何区间。
    Wait,
}

/// Ties the monitor queue, RTT estimator, utility function and rate
/// controller together for one connection.
///
/// 为单个连接将监测队列、RTT估算器、效用函数和速率控制器绑定在一起。
pub struct ControlLoop<S: PacingSink> {
    config: Config,
    state: State,
    sink: S,
    controller: RateController,
    utility: Box<dyn UtilityFunction>,
    rtt: RttEstimator,
    queue: MonitorIntervalQueue,
    sending_rate: Rate,
    next_interval_id: u64,
}

impl<S: PacingSink> ControlLoop<S> {
    /// Builds a loop with the default utility function. Fails if the
    /// configuration is internally inconsistent.
    /// 以默认效用函数构建回路。若配置内部不一致则失败。
    pub fn new(config: Config, controller: RateController, sink: S) -> Result<Self> {
        config.validate()?;
        let sending_rate = config.monitor.initial_rate;
        let utility = Box::new(VivaceUtility::new(config.utility.clone()));
        Ok(Self {
            config,
            state: State::Active,
            sink,
            controller,
            utility,
            rtt: RttEstimator::new(),
            queue: MonitorIntervalQueue::new(),
            sending_rate,
            next_interval_id: 0,
        })
    }

    /// Swaps in a custom utility function.
    /// 换入自定义的效用函数。
    pub fn with_utility_function(mut self, utility: Box<dyn UtilityFunction>) -> Self {
        self.utility = utility;
        self
    }

    /// Feeds one sent packet into the loop. Opens a fresh monitor interval
    /// when the current one's sending phase has ended (or none exists yet).
    /// 向回路喂入一个已发送的包。当当前区间的发送阶段已结束（或尚无区间）时，
    /// 开启一个新的监测区间。
    pub fn on_packet_sent(&mut self, now: Instant, seq: u64, size: u64) {
        if self.state == State::Wait {
            trace!(seq, "in loss recovery, send not monitored");
            return;
        }
        let needs_interval = match self.queue.current() {
            Some(interval) => interval.all_packets_sent(now),
            None => true,
        };
        if needs_interval {
            self.open_interval(now);
        }
        self.queue.on_packet_sent(now, seq, size);
    }

    /// Feeds one acknowledgment into the loop.
    /// 向回路喂入一个确认。
    pub fn on_packet_acked(&mut self, now: Instant, seq: u64, size: u64, rtt: Duration) {
        self.rtt.add_sample(rtt);
        self.queue.on_packet_acked(now, seq, size, rtt);
        if self.state == State::Active {
            self.finalize_ready(now);
        }
    }

    /// Feeds one loss into the loop.
    /// 向回路喂入一个丢失。
    pub fn on_packet_lost(&mut self, now: Instant, seq: u64, size: u64) {
        self.queue.on_packet_lost(now, seq, size);
        if self.state == State::Active {
            self.finalize_ready(now);
        }
    }

    /// Hands the send path over to loss recovery.
    /// 将发送路径移交给丢包恢复。
    pub fn enter_loss_recovery(&mut self) {
        if self.state == State::Wait {
            return;
        }
        self.state = State::Wait;
        debug!("entering loss recovery, monitoring paused");
    }

    /// Takes the send path back from loss recovery. An RTT measured during
    /// recovery may be folded in; the current pacing rate is re-applied so
    /// the transport does not keep a recovery-era rate.
    /// 从丢包恢复取回发送路径。恢复期间测得的RTT可以折算进来；
    /// 当前整流速率会被重新应用，使传输层不会保留恢复期的速率。
    pub fn exit_loss_recovery(&mut self, now: Instant, recovery_rtt: Option<Duration>) {
        if self.state == State::Active {
            return;
        }
        if let Some(rtt) = recovery_rtt {
            self.rtt.add_sample(rtt);
        }
        self.state = State::Active;
        self.sink
            .apply_pacing_rate(self.sending_rate.mul_f64(self.config.monitor.pacing_gain));
        debug!(rate = %self.sending_rate, "exiting loss recovery, monitoring resumed");
        self.finalize_ready(now);
    }

    /// Drops all in-flight intervals and per-episode controller bookkeeping.
    /// The learned rate and RTT estimate survive.
    /// 丢弃所有在途区间和控制器的回合内簿记。已学到的速率和RTT估计保留。
    pub fn reset(&mut self) {
        self.queue.clear();
        self.controller.reset();
        self.state = State::Active;
    }

    /// The most recently decided target sending rate.
    /// 最近决定的目标发送速率。
    pub fn current_rate(&self) -> Rate {
        self.sending_rate
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn rtt(&self) -> &RttEstimator {
        &self.rtt
    }

    /// Asks the controller for the next rate, opens a window at it, and
    /// pushes the paced rate to the transport.
    /// 向控制器询问下一个速率，按该速率开启窗口，并将整流速率推送给传输层。
    fn open_interval(&mut self, now: Instant) {
        self.sending_rate = self.controller.next_rate(self.sending_rate);
        if self.sending_rate.is_zero() {
            self.sending_rate = self.config.controller.min_rate;
        }
        let duration = self.interval_duration();
        let id = self.next_interval_id;
        self.next_interval_id += 1;
        self.queue
            .push(MonitorInterval::new(id, self.sending_rate, now + duration));
        self.sink
            .apply_pacing_rate(self.sending_rate.mul_f64(self.config.monitor.pacing_gain));
        debug!(
            id,
            rate = %self.sending_rate,
            duration_ms = duration.as_millis() as u64,
            "monitor interval opened"
        );
    }

    /// An interval lasts a fraction of the conservative RTT estimate, but
    /// never less than the time needed to carry the minimum packet count at
    /// the target rate. At low rates the packet term dominates.
    /// 区间持续保守RTT估计的一个比例，但绝不短于以目标速率承载最少包数
    /// 所需的时间。在低速率下包数项起主导作用。
    fn interval_duration(&self) -> Duration {
        let monitor = &self.config.monitor;
        let rtt_term = monitor.interval_rtt_fraction * self.rtt.conservative().as_secs_f64();
        let min_bits =
            f64::from(monitor.min_packets_per_interval) * 8.0 * f64::from(monitor.reference_segment_size);
        let packet_term = min_bits / self.sending_rate.as_bps() as f64;
        Duration::from_secs_f64(rtt_term.max(packet_term))
    }

    /// Scores and retires every interval that is fully accounted for, in
    /// creation order.
    /// 按创建顺序为每个已完全记账的区间打分并退役。
    fn finalize_ready(&mut self, now: Instant) {
        while self.queue.has_finished_interval(now) {
            let Some(mut interval) = self.queue.pop() else {
                break;
            };
            let score = self.utility.utility(&interval);
            interval.set_utility(score);
            debug!(
                id = interval.id(),
                rate = %interval.target_rate(),
                utility = score,
                loss = interval.loss_rate(),
                "monitor interval finalized"
            );
            self.controller.interval_finished(&interval);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::Config;
    use std::sync::{Arc, Mutex};

    const PACKET: u64 = 1400;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Records every pacing rate the loop pushes to the transport.
    #[derive(Debug, Clone, Default)]
    struct TestSink(Arc<Mutex<Vec<Rate>>>);

    impl PacingSink for TestSink {
        fn apply_pacing_rate(&mut self, rate: Rate) {
            self.0.lock().unwrap().push(rate);
        }
    }

    impl TestSink {
        fn rates(&self) -> Vec<Rate> {
            self.0.lock().unwrap().clone()
        }
    }

    fn fixed_loop(fixed_rate: Rate) -> (ControlLoop<TestSink>, TestSink) {
        let mut config = Config::default();
        config.controller.fixed_rate = fixed_rate;
        let controller = RateController::fixed(&config.controller);
        let sink = TestSink::default();
        let engine = ControlLoop::new(config, controller, sink.clone()).unwrap();
        (engine, sink)
    }

    #[test]
    fn test_first_send_opens_interval_and_paces() {
        let (mut engine, sink) = fixed_loop(Rate::from_mbps(1));
        let t0 = Instant::now();

        engine.on_packet_sent(t0, 1, PACKET);

        assert_eq!(engine.queue.len(), 1);
        assert_eq!(engine.current_rate(), Rate::from_mbps(1));
        // pacing_gain 1.1 applied on top of the decided rate
        assert_eq!(sink.rates(), vec![Rate::from_bps(1_100_000)]);
    }

    #[test]
    fn test_sends_after_end_time_open_the_next_interval() {
        let (mut engine, sink) = fixed_loop(Rate::from_mbps(1));
        let t0 = Instant::now();

        // Unseeded RTT: the window lasts 5 * 8 * 1400 / 1e6 = 56ms.
        engine.on_packet_sent(t0, 1, PACKET);
        engine.on_packet_sent(t0 + ms(10), 2, PACKET);
        assert_eq!(engine.queue.len(), 1);

        engine.on_packet_sent(t0 + ms(100), 3, PACKET);
        assert_eq!(engine.queue.len(), 2);
        assert_eq!(sink.rates().len(), 2);
    }

    #[test]
    fn test_low_rate_stretches_the_window() {
        let (mut engine, _sink) = fixed_loop(Rate::from_kbps(512));
        let t0 = Instant::now();

        engine.on_packet_sent(t0, 1, PACKET);

        // 5 packets of 1400 bytes at 512kbps need 56000 / 512000 s.
        let expected = Duration::from_secs_f64(56_000.0 / 512_000.0);
        let window_len = engine.queue.current().unwrap().end_time() - t0;
        assert_eq!(window_len, expected);
    }

    #[test]
    fn test_rtt_estimate_sizes_later_windows() {
        let (mut engine, _sink) = fixed_loop(Rate::from_mbps(10));
        let t0 = Instant::now();

        engine.on_packet_sent(t0, 1, PACKET);
        // Seeds srtt = 0.2, rttvar = 0.1; conservative = 0.6s.
        engine.on_packet_acked(t0 + ms(5), 1, PACKET, ms(200));

        engine.on_packet_sent(t0 + ms(10), 2, PACKET);
        let window_len = engine.queue.current().unwrap().end_time() - (t0 + ms(10));
        // Half the conservative estimate dwarfs the 5.6ms packet term.
        assert!((window_len.as_secs_f64() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_finished_interval_drives_the_next_rate_decision() {
        let mut config = Config::default();
        config.controller.fixed_rate = Rate::from_mbps(2);
        config.controller.halve_after_intervals = Some(1);
        let controller = RateController::fixed(&config.controller);
        let sink = TestSink::default();
        let mut engine = ControlLoop::new(config, controller, sink.clone()).unwrap();
        let t0 = Instant::now();

        engine.on_packet_sent(t0, 1, PACKET);
        // Past the window's end and fully accounted: the interval finalizes.
        engine.on_packet_acked(t0 + ms(500), 1, PACKET, ms(50));
        assert_eq!(engine.queue.len(), 0);

        engine.on_packet_sent(t0 + ms(600), 2, PACKET);
        assert_eq!(engine.current_rate(), Rate::from_mbps(1));
        assert_eq!(sink.rates().last().copied(), Some(Rate::from_bps(1_100_000)));
    }

    #[test]
    fn test_loss_recovery_pauses_monitoring() {
        let (mut engine, sink) = fixed_loop(Rate::from_mbps(1));
        let t0 = Instant::now();

        engine.on_packet_sent(t0, 1, PACKET);
        engine.enter_loss_recovery();
        assert_eq!(engine.state(), State::Wait);

        // Sends during recovery open no windows and push no pacing rates.
        engine.on_packet_sent(t0 + ms(100), 2, PACKET);
        assert_eq!(engine.queue.len(), 1);
        assert_eq!(sink.rates().len(), 1);

        // The ack is accounted but the finished window is not finalized yet.
        engine.on_packet_acked(t0 + ms(150), 1, PACKET, ms(50));
        assert_eq!(engine.queue.len(), 1);

        engine.exit_loss_recovery(t0 + ms(200), Some(ms(60)));
        assert_eq!(engine.state(), State::Active);
        // Pacing is re-applied and the pending window retires.
        assert_eq!(sink.rates().len(), 2);
        assert_eq!(engine.queue.len(), 0);
    }

    #[test]
    fn test_reset_drops_in_flight_windows() {
        let (mut engine, _sink) = fixed_loop(Rate::from_mbps(1));
        let t0 = Instant::now();

        engine.on_packet_sent(t0, 1, PACKET);
        engine.enter_loss_recovery();
        engine.reset();

        assert_eq!(engine.queue.len(), 0);
        assert_eq!(engine.state(), State::Active);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.controller.min_rate = Rate::ZERO;
        let controller = RateController::fixed(&config.controller);
        let result = ControlLoop::new(config, controller, TestSink::default());
        assert!(result.is_err());
    }
}
