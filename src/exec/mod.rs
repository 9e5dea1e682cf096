// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] wraps one worker OS process: spawn, send, events, exit, kill.
//! - [`backend`] provides the `WorkerBackend` trait and the production
//!   `RealWorkerBackend`, which tests can replace with a fake implementation.

pub mod backend;
pub mod process;

pub use backend::{BackendFuture, RealWorkerBackend, WorkerBackend};
pub use process::{WorkerExit, WorkerLauncher, WorkerProcess};
