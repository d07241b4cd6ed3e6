//! Monte Carlo planner for limited character and weapon banners.
//!
//! Plays a multi-version banner roadmap many times under a pull strategy and
//! reports how many limited characters and signature weapons the stockpile
//! secures, or how much must be topped up to secure all of them.

pub mod config;
pub mod error;
pub mod gacha;
pub mod report;
pub mod rng;
pub mod sim;
pub mod stats;
pub mod strategy;
pub mod trial;
pub mod weapon;
pub mod worker;

pub use config::{Config, ConfigError, WorkerConfig};
pub use error::SimError;
pub use rng::Rng;
pub use sim::{run_simulation, run_top_up_simulation, SimInput, SimOutput, TopUpSimOutput};
pub use strategy::{AddonStrategies, BaseStrategy, StrategyConfig};
pub use worker::SimWorker;
