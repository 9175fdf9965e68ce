//! End-to-end runs of the control loop over synthetic packet timelines.

mod common;

use aurora_pcc::agent::{agent_channel, Action};
use aurora_pcc::config::Config;
use aurora_pcc::controller::RateController;
use aurora_pcc::engine::ControlLoop;
use aurora_pcc::monitor::MonitorInterval;
use aurora_pcc::rate::Rate;
use aurora_pcc::utility::{UtilityFunction, VivaceUtility};
use common::{init_tracing, RecordingSink};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const PACKET: u64 = 1400;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Wraps the default utility function and records each (interval id, score)
/// pair so tests can observe finalization.
struct RecordingUtility {
    inner: VivaceUtility,
    scores: Arc<Mutex<Vec<(u64, f64)>>>,
}

impl UtilityFunction for RecordingUtility {
    fn utility(&self, interval: &MonitorInterval) -> f64 {
        let score = self.inner.utility(interval);
        self.scores.lock().unwrap().push((interval.id(), score));
        score
    }
}

#[test]
fn test_steady_path_keeps_rate_inside_configured_bounds() {
    init_tracing();
    let mut config = Config::default();
    config.controller.perturbation_seed = Some(42);
    config.controller.min_rate = Rate::from_kbps(512);
    config.controller.max_rate = Rate::from_mbps(10);
    let bounds = config.controller.clone();
    let controller = RateController::perturbation(&config.controller);
    let sink = RecordingSink::default();
    let mut engine = ControlLoop::new(config, controller, sink.clone()).unwrap();

    let mut t = Instant::now();
    for seq in 1..=50u64 {
        engine.on_packet_sent(t, seq, PACKET);
        engine.on_packet_acked(t + ms(30), seq, PACKET, ms(30));
        t += ms(200);
        assert!(engine.current_rate() >= bounds.min_rate);
        assert!(engine.current_rate() <= bounds.max_rate);
    }
    // One pacing decision per window opened.
    assert!(sink.rates().len() > 10);
}

#[test]
fn test_loss_drags_the_utility_score_down() {
    init_tracing();
    let config = Config::default();
    let controller = RateController::fixed(&config.controller);
    let scores = Arc::new(Mutex::new(Vec::new()));
    let recorder = RecordingUtility {
        inner: VivaceUtility::new(config.utility.clone()),
        scores: scores.clone(),
    };
    let mut engine = ControlLoop::new(config, controller, RecordingSink::default())
        .unwrap()
        .with_utility_function(Box::new(recorder));

    let t0 = Instant::now();
    // A clean window: two packets sent, both acknowledged.
    engine.on_packet_sent(t0, 1, PACKET);
    engine.on_packet_sent(t0 + ms(50), 2, PACKET);
    engine.on_packet_acked(t0 + ms(80), 1, PACKET, ms(30));
    engine.on_packet_acked(t0 + ms(130), 2, PACKET, ms(30));

    // A lossy window at the same rate: one of two packets never arrives.
    engine.on_packet_sent(t0 + ms(200), 3, PACKET);
    engine.on_packet_sent(t0 + ms(250), 4, PACKET);
    engine.on_packet_acked(t0 + ms(280), 3, PACKET, ms(30));
    engine.on_packet_lost(t0 + ms(400), 4, PACKET);

    let scores = scores.lock().unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].0, 0);
    assert_eq!(scores[1].0, 1);
    assert!(scores[1].1 < scores[0].1);
}

#[test]
fn test_out_of_order_acks_finalize_windows_in_creation_order() {
    init_tracing();
    let mut config = Config::default();
    config.controller.fixed_rate = Rate::from_mbps(1);
    let controller = RateController::fixed(&config.controller);
    let scores = Arc::new(Mutex::new(Vec::new()));
    let recorder = RecordingUtility {
        inner: VivaceUtility::new(config.utility.clone()),
        scores: scores.clone(),
    };
    let mut engine = ControlLoop::new(config, controller, RecordingSink::default())
        .unwrap()
        .with_utility_function(Box::new(recorder));

    let t0 = Instant::now();
    engine.on_packet_sent(t0, 1, PACKET);
    engine.on_packet_sent(t0 + ms(60), 2, PACKET);

    // The later sequence arrives first. It resolves the first window
    // (the peer has moved past it) and accounts for the second, yet the
    // windows still retire oldest first.
    engine.on_packet_acked(t0 + ms(200), 2, PACKET, ms(30));
    engine.on_packet_acked(t0 + ms(210), 1, PACKET, ms(30));

    let scores = scores.lock().unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].0, 0);
    assert_eq!(scores[1].0, 1);
}

#[test]
fn test_agent_zero_action_leaves_rate_unchanged() {
    init_tracing();
    let config = Config::default();
    let (driver, mut endpoint) = agent_channel(config.agent.channel_capacity);
    let controller = RateController::agent(&config.controller, &config.agent, driver);
    let initial = config.monitor.initial_rate;
    let mut engine = ControlLoop::new(config, controller, RecordingSink::default()).unwrap();

    let mut t = Instant::now();
    for seq in 1..=5u64 {
        endpoint.try_send_action(Action(0.0)).unwrap();
        engine.on_packet_sent(t, seq, PACKET);
        engine.on_packet_acked(t + ms(30), seq, PACKET, ms(30));
        t += ms(200);
        assert_eq!(engine.current_rate(), initial);
    }

    // Every retired window produced one step snapshot.
    let mut snapshots = 0;
    while endpoint.try_recv().unwrap().is_some() {
        snapshots += 1;
    }
    assert_eq!(snapshots, 4);
}

#[test]
fn test_windows_with_no_delivery_report_the_penalty_reward() {
    init_tracing();
    let config = Config::default();
    let (driver, mut endpoint) = agent_channel(config.agent.channel_capacity);
    let controller = RateController::agent(&config.controller, &config.agent, driver);
    let sentinel = config.agent.zero_throughput_reward;
    let mut engine = ControlLoop::new(config, controller, RecordingSink::default()).unwrap();

    let t0 = Instant::now();
    engine.on_packet_sent(t0, 1, PACKET);
    engine.on_packet_lost(t0 + ms(300), 1, PACKET);

    let snapshot = endpoint.try_recv().unwrap().unwrap();
    assert_eq!(snapshot.reward, sentinel);
}
