//! Overlay core for the stream wheel: spin lifecycle, layout, and gestures.
//!
//! This crate is pure state: it performs no I/O and owns no clock. The host
//! runtime feeds it decoded inbound messages, pointer/key input, animation
//! ticks, and fired timers, all stamped with a millisecond timestamp. It
//! answers with outbound messages for the transport and with calls on a
//! [`render::Renderer`] the host supplies.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::OverlayCore`]: message dispatch and component wiring |
//! | [`spin`] | Spin engine state machine and winner math |
//! | [`layout`] | Per-widget position/scale store |
//! | [`gesture`] | Drag/resize gesture controller |
//! | [`hit`] | Pointer hit testing against widget bounds |
//! | [`input`] | Pointer targets, keys, and the gesture state machine |
//! | [`connection`] | Connection state machine with reconnect scheduling |
//! | [`timers`] | Cancelable timer queue shared by all components |
//! | [`viewport`] | Pixel/percentage conversions and widget geometry |
//! | [`render`] | Renderer interface consumed by the engine |
//! | [`consts`] | Timing and clamping constants |

pub mod connection;
pub mod consts;
pub mod engine;
pub mod gesture;
pub mod hit;
pub mod input;
pub mod layout;
pub mod render;
pub mod spin;
pub mod timers;
pub mod viewport;

#[cfg(test)]
mod recording;
