pub mod batch;
pub mod config;

pub use batch::{BatchOptions, BatchReport, run_batch};
pub use config::{init_tracing, load_config, load_mission};
