//! Production browser engine: Playwright driven through a Node.js child.
//!
//! One driver process is spawned per run. Its embedded script launches a
//! single Chromium instance and then serves JSON-line commands over stdio,
//! so every capture task can open its own isolated context against the one
//! shared browser.
//!
//! # Module Structure
//!
//! - [`driver`] - driver process lifecycle and the engine trait bindings
//! - [`script`] - the embedded Node script, availability checks, error mapping

mod driver;
mod script;

pub use driver::{
    EngineOptions, PlaywrightEngine, PlaywrightLauncher, DEFAULT_COMMAND_GUARD,
    DEFAULT_LAUNCH_TIMEOUT,
};
