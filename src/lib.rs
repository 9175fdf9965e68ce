#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the PCC congestion-control decision engine library.
//! PCC拥塞控制决策引擎库的根。

pub mod config;
pub mod error;
pub mod rate;

pub mod agent;
pub mod controller;
pub mod engine;
pub mod monitor;
pub mod rtt;
pub mod utility;
