//! Dangerous Dave as a deterministic tick simulation.
//!
//! `domain` holds the pure rules and tables, `sim` owns the mutable game
//! state and the per-tick step, and `ui` drives a terminal front end.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
pub mod ui;

pub use error::{LevelError, SimError};
