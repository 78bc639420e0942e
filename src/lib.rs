//! terralite - a deterministic 2D tile sandbox engine
//!
//! The root package ties the world, physics and persistence crates into a
//! [`Session`](session::Session) that an embedding UI drives tick by tick,
//! plus a headless runner for scripted play and CI.

pub mod command_script;
pub mod commands;
pub mod config;
pub mod fixed_step;
pub mod headless;
pub mod mining;
pub mod scripted_input;
pub mod session;

pub use commands::{Command, SessionEvent, SessionSnapshot, StepInput};
pub use config::SessionConfig;
pub use fixed_step::FixedStepLoop;
pub use session::Session;
