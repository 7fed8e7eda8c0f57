//! Decision core for a battery-powered irrigation weather node.
//!
//! Each wake cycle turns one raw (temperature, pressure) reading into a
//! smoothed sea-level pressure, a short-term trend code and an irrigation
//! recommendation.  The only state that survives between cycles is
//! [`RetainedState`], which the host loads before and saves after
//! [`run_cycle`].

pub mod altitude;
pub mod config;
pub mod cycle;
pub mod decision;
pub mod estimator;
pub mod history;
pub mod retained;
pub mod trend;

pub use config::SiteConfig;
pub use cycle::{run_cycle, CycleInputs, CycleResult};
pub use decision::Decision;
pub use retained::RetainedState;
pub use trend::Trend;
