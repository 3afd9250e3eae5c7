//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the visualizer:
//! - Math and color types
//! - Simulation time and availability intervals
//! - Single-threaded listener lists
//! - Logging utilities

pub mod math;
pub mod time;
pub mod event;
pub mod logging;
