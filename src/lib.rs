//! Runway: land reviewed changes onto remote branches.
//!
//! The flow is a pipeline: resolve what to land and where, integrate it
//! locally (squash or merge), push, clean up consumed branches, and put the
//! working copy back in a sensible state. `engine` owns the pipeline;
//! `repo` is the git gateway it drives; `commands` is the CLI surface.

pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod exec;
pub mod local_state;
pub mod lock;
pub mod repo;
pub mod ui;
