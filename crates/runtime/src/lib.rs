//! Runtime layer: wall-clock time, player commands, and the ambient services
//! (configuration, tracing, event log) around the pure core.

pub mod bot;
pub mod config;
pub mod driver;
pub mod event_log;
pub mod logging;

pub use bot::Bot;
pub use config::RunnerConfig;
pub use driver::{run_driver, Command, DriverOptions, Envelope, Update, COMMAND_QUEUE};
pub use event_log::EventLog;
pub use logging::init_tracing;
