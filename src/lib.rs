//! Stream overlay client for the spin wheel.
//!
//! Connects to the controller over a websocket, runs the wheel and widget
//! layout from [`overlay`], and reports results and layout edits back.

pub mod config;
pub mod console;
pub mod error;
pub mod render;
pub mod runtime;
pub mod state;
pub mod transport;
