//! Game interaction used during recognition.
//!
//! This module provides:
//! - Controller / stabilizer contracts and the touch gesture abstraction
//! - A replay controller serving recorded frames for offline runs

pub mod controller;
pub mod replay;

#[cfg(test)]
pub mod testing;

pub use controller::{Controller, Gesture, NoopStabilizer, Stabilizer, TouchGuard, TouchStep};
pub use replay::ReplayController;
