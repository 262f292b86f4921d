//! Headless simulation host - runs a feature suite against a scene without rendering

pub mod app_builder;
pub mod runner;

pub use app_builder::{HeadlessAppBuilder, install_logging};
pub use runner::{BuildOptions, RunOutcome, run_build, run_suite};
