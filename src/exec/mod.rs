// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production; tests swap in a fake.
//! - [`executor_loop`] owns the background loop receiving scheduled tasks.
//! - [`task_runner`] runs a single task's action and reports the outcome.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use task_runner::invoke_action;
