//! Collaborators the scheduler depends on but does not own.
//!
//! - [`window_planner`]: nightly observing windows, optionally cut to half
//!   nights.

pub mod window_planner;

pub use window_planner::{HalfNightPlanner, WindowPlanner, WindowTable};
