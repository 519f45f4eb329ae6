// src/dag/mod.rs

//! Task graph and per-run scheduling.
//!
//! - [`graph`] holds the immutable, validated DAG of tasks.
//! - [`validate`] rejects duplicate names, dangling or self prerequisites
//!   and cycles before anything runs.
//! - [`scheduler`] hands out build runs over the shared graph.
//! - [`build_run`] is the per-run state machine deciding which tasks are
//!   ready and enforcing at-most-once and fail-fast.
//! - [`task_info`] and [`scheduler_step`] are the types exchanged with the
//!   engine.
//! - [`state_manager`] performs the per-run state transitions.

pub mod build_run;
pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;
pub mod validate;

pub use build_run::{BuildReport, BuildRun, TaskFailure};
pub use graph::{TaskAction, TaskDecl, TaskGraph, TaskGraphBuilder};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};
