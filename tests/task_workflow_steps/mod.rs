//! Step definitions for shared task workflow scenarios.

pub mod then;
pub mod when;
pub mod world;
