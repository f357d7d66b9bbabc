//! Conveyor sorter (workspace facade crate).
//!
//! Re-exports the member crates under `crates/` as
//! `conveyor_sorter::{core,runtime,term,types}`.

pub use conveyor_sorter_core as core;
pub use conveyor_sorter_runtime as runtime;
pub use conveyor_sorter_term as term;
pub use conveyor_sorter_types as types;
