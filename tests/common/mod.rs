//! tests/common/mod.rs
#![allow(dead_code)]

use aurora_pcc::engine::PacingSink;
use aurora_pcc::rate::Rate;
use std::sync::{Arc, Mutex, Once};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "aurora_pcc=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A pacing sink that records every rate pushed to it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<Rate>>>);

impl RecordingSink {
    pub fn rates(&self) -> Vec<Rate> {
        self.0.lock().unwrap().clone()
    }
}

impl PacingSink for RecordingSink {
    fn apply_pacing_rate(&mut self, rate: Rate) {
        self.0.lock().unwrap().push(rate);
    }
}
